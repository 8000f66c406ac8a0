use nl_api_types::Usd;

/// Per-asset loan amount input and its confirm action.
///
/// An amount is accepted only while it does not exceed the asset's current
/// estimated value. There is no lower bound: a negative amount is accepted
/// and confirming it raises the value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoanGate {
    pending: i64,
    enabled: bool,
}

impl LoanGate {
    pub fn pending_amount(&self) -> i64 {
        self.pending
    }

    pub fn confirm_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns whether `input` was accepted as the pending amount.
    pub fn propose(&mut self, input: &str, value: Usd) -> bool {
        match parse_leading_int(input) {
            Some(amount) if Usd::from_whole(amount) <= value => {
                self.pending = amount;
                self.enabled = true;
                true
            }
            _ => {
                self.pending = 0;
                self.enabled = false;
                false
            }
        }
    }

    /// Applies the pending amount to `value`. `None` while confirm is disabled.
    pub fn confirm(&mut self, value: Usd) -> Option<Usd> {
        if !self.enabled {
            return None;
        }
        let remaining = value.saturating_sub(Usd::from_whole(self.pending));
        self.pending = 0;
        self.enabled = false;
        Some(remaining)
    }
}

/// Leading base-10 integer of `input`: optional sign, then digits; anything
/// after the digits is ignored. `None` when no digits lead.
pub fn parse_leading_int(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
