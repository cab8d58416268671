/// Prefix plus fixed-width zero-padded numeric suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeFormat {
    prefix: &'static str,
    width: usize,
}

/// Asset codes: `TS00001`.
pub const ASSET_CODE: CodeFormat = CodeFormat::new("TS", 5);

/// Increase voucher numbers: `GT00001`.
pub const VOUCHER_NO: CodeFormat = CodeFormat::new("GT", 5);

impl CodeFormat {
    pub const fn new(prefix: &'static str, width: usize) -> Self {
        Self { prefix, width }
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Render `n` as a code. Values wider than the suffix width are not
    /// truncated: `TS` + 100000 is `TS100000`.
    pub fn format(&self, n: u64) -> String {
        format!("{}{:0width$}", self.prefix, n, width = self.width)
    }

    /// Parse the numeric suffix of `code`.
    ///
    /// Returns `None` unless `code` is the exact prefix followed by one or
    /// more ASCII digits.
    pub fn parse_suffix(&self, code: &str) -> Option<u64> {
        let digits = code.strip_prefix(self.prefix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}
