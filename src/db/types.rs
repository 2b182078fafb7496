use std::fmt;

use serde::{Deserialize, Serialize};

/// Allowed question weights, in the order composition walks them.
pub(crate) const POINT_VALUES: [u8; 5] = [1, 2, 3, 5, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "teacher" => Some(Role::Teacher),
            "student" => Some(Role::Student),
            _ => None,
        }
    }
}

/// A question weight drawn from [`POINT_VALUES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub(crate) struct PointValue(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("point value {0} is not one of the allowed values {POINT_VALUES:?}")]
pub(crate) struct InvalidPointValue(pub(crate) i64);

impl PointValue {
    pub(crate) fn all() -> impl Iterator<Item = PointValue> {
        POINT_VALUES.into_iter().map(PointValue)
    }

    pub(crate) fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for PointValue {
    type Error = InvalidPointValue;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        POINT_VALUES
            .iter()
            .copied()
            .find(|allowed| i64::from(*allowed) == value)
            .map(PointValue)
            .ok_or(InvalidPointValue(value))
    }
}

impl From<PointValue> for i64 {
    fn from(value: PointValue) -> Self {
        i64::from(value.0)
    }
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
