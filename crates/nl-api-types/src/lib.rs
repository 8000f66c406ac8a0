use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WalletAddress(pub String);

impl WalletAddress {
    /// Lowercased form, for comparisons across checksummed and plain hex.
    pub fn normalized(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    pub fn same_account(&self, other: &WalletAddress) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(pub u64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a contract starts numbering its tokens.
///
/// Deployments disagree: some mint token `0` first, others token `1`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IndexBase {
    #[default]
    Zero,
    One,
}

impl IndexBase {
    /// Token ids to walk for an owner holding `count` tokens.
    pub fn token_ids(self, count: u64) -> impl Iterator<Item = TokenId> {
        let range = match self {
            IndexBase::Zero => 0..count,
            IndexBase::One => 1..count.saturating_add(1),
        };
        range.map(TokenId)
    }
}

impl FromStr for IndexBase {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "0" | "zero" => Ok(IndexBase::Zero),
            "1" | "one" => Ok(IndexBase::One),
            other => Err(format!("invalid token index base '{other}', expected 0 or 1")),
        }
    }
}

/// Dollar amount with exactly two decimal digits, stored as cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Usd(i64);

impl Usd {
    pub const ZERO: Usd = Usd(0);

    pub const fn from_cents(cents: i64) -> Self {
        Usd(cents)
    }

    pub fn from_whole(units: i64) -> Self {
        Usd(units.saturating_mul(100))
    }

    /// Rounds half away from zero to the nearest cent.
    pub fn from_f64_rounded(value: f64) -> Self {
        Usd((value * 100.0).round() as i64)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn saturating_sub(self, other: Usd) -> Usd {
        Usd(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Usd {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        let all_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
        if whole.is_empty() || fraction.len() > 2 || !all_digits(whole) || !all_digits(fraction) {
            return Err(format!("invalid usd amount '{value}'"));
        }
        let whole: i64 = whole
            .parse()
            .map_err(|_| format!("invalid usd amount '{value}'"))?;
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| format!("invalid usd amount '{value}'"))? * 10,
            _ => fraction.parse().map_err(|_| format!("invalid usd amount '{value}'"))?,
        };
        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .ok_or_else(|| format!("usd amount out of range '{value}'"))?;
        Ok(Usd(if negative { -cents } else { cents }))
    }
}

impl From<Usd> for String {
    fn from(value: Usd) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Usd {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// JSON document served from a token's metadata URI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenMetadata {
    pub image: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: Vec<serde_json::Value>,
}

impl TokenMetadata {
    pub fn validate(&self) -> Result<(), String> {
        if self.image.trim().is_empty() {
            return Err("metadata image is empty".to_owned());
        }
        Ok(())
    }
}

// ── HTTP DTOs ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub has_provider: bool,
    pub connected: bool,
    pub accounts: Vec<String>,
    pub primary_account: Option<String>,
    pub can_connect: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanGateView {
    pub pending_amount: i64,
    pub confirm_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetView {
    pub token_id: u64,
    pub owner: String,
    pub metadata_uri: String,
    pub image: Option<String>,
    pub estimated_value: Usd,
    pub loan: LoanGateView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsResponse {
    pub loading: bool,
    pub generation: u64,
    pub assets: Vec<AssetView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanProposeRequest {
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanProposeResponse {
    pub token_id: u64,
    pub accepted: bool,
    pub estimated_value: Usd,
    pub loan: LoanGateView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub started: bool,
}
