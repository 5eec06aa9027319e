use once_cell::sync::Lazy;
use regex::Regex;

/// `<line> <address> <MNEMONIC ...>` rows of a C51 listing.
static LISTING_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*\d+\s+[0-9A-F]+\s+([A-Z]+.*$)").expect("Invalid regex pattern")
});

static LEADING_LINE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+\s+").expect("Invalid regex pattern"));

const HEADER_PREFIXES: &[&str] = &[";", "MODULE", "COMPILER", "SUMMARY", "FUNCTION", "NAME"];

const COMMON_MNEMONICS: &[&str] = &[
    "MOV", "ADD", "SUB", "MUL", "DIV", "JMP", "CALL", "RET", "PUSH", "POP",
];

/// Reduce a Keil C51 `.lst` listing to its assembly instruction lines.
pub fn extract_code_from_listing(listing: &str) -> String {
    let mut instructions = Vec::new();

    for raw_line in listing.lines() {
        let line = raw_line.trim();

        if HEADER_PREFIXES.iter().any(|prefix| line.starts_with(prefix)) {
            continue;
        }

        if let Some(captures) = LISTING_ROW.captures(line) {
            let instruction = captures[1].trim();
            if !instruction.is_empty() && !instruction.starts_with('.') {
                instructions.push(instruction.to_string());
            }
            continue;
        }

        let upper = line.to_uppercase();
        if COMMON_MNEMONICS.iter().any(|op| upper.contains(op)) {
            let stripped = LEADING_LINE_NUMBER.replace(line, "");
            let stripped = stripped.trim();
            if !stripped.is_empty() {
                instructions.push(stripped.to_string());
            }
        }
    }

    instructions.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_listing_rows() {
        let listing = "\
C51 COMPILER V9.60.0.0   MAIN                      10/18/2026 09:12:44 PAGE 1
NAME MAIN
; FUNCTION main (BEGIN)
   12 0000        MOV     P1,#0FFH
   13 0003        SJMP    $
SUMMARY OF MODULE
";
        assert_eq!(
            extract_code_from_listing(listing),
            "MOV     P1,#0FFH\nSJMP    $"
        );
    }

    #[test]
    fn test_extract_mnemonic_fallback() {
        let listing = "   7       mov a, r7\n   8       nothing here\n";
        assert_eq!(extract_code_from_listing(listing), "mov a, r7");
    }

    #[test]
    fn test_extract_empty() {
        assert_eq!(extract_code_from_listing(""), "");
    }
}
