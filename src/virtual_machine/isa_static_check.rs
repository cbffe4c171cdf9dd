#[cfg(test)]
mod tests {
    /// Frozen rendering of the instruction table. Editing the table without
    /// updating this string is an ISA change and must be deliberate.
    const EXPECTED_ISA_SIGNATURE: &str = "\
Idle=0x00 IDLE []
Push=0x01 PUSH [src:Src]
Pop=0x02 POP [dst:OptAddr]
Inc=0x03 INC [target:Target]
Add=0x04 ADD [lhs:Src rhs:Src]
Sub=0x05 SUB [lhs:Src rhs:Src]
Store=0x06 STORE [src:OptSrc dst:Addr]
Load=0x07 LOAD [src:Addr]
Free=0x08 FREE [addr:Addr]
Print=0x09 PRINT [src:Src]
";

    macro_rules! render_isa {
        (
            $( $(#[$doc:meta])* $name:ident = $opcode:expr, $mnemonic:literal => [ $( $field:ident : $kind:ident ),* $(,)? ] ),* $(,)?
        ) => {{
            let mut out = String::new();
            $(
                let operands: Vec<String> = vec![
                    $( format!("{}:{}", stringify!($field), stringify!($kind)) ),*
                ];
                out.push_str(&format!(
                    "{}={:#04x} {} [{}]\n",
                    stringify!($name),
                    crate::virtual_machine::isa::Opcode::$name as u8,
                    $mnemonic,
                    operands.join(" "),
                ));
            )*
            out
        }};
    }

    fn current_isa_signature() -> String {
        crate::for_each_instruction!(render_isa)
    }

    #[test]
    #[ignore]
    fn print_isa_signature() {
        println!("{}", current_isa_signature());
    }

    #[test]
    fn isa_signature_unchanged() {
        assert_eq!(current_isa_signature(), EXPECTED_ISA_SIGNATURE);
    }
}
