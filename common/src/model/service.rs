use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::detail::{self, Detail};

/// Which scalar of a [`Service`] an [`Alternative`] was discarded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceField {
    Name,
    Product,
    Version,
    ExtraInfo,
}

impl ServiceField {
    pub const ALL: [ServiceField; 4] = [
        ServiceField::Name,
        ServiceField::Product,
        ServiceField::Version,
        ServiceField::ExtraInfo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceField::Name => "name",
            ServiceField::Product => "product",
            ServiceField::Version => "version",
            ServiceField::ExtraInfo => "extra_info",
        }
    }
}

impl fmt::Display for ServiceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value another source reported that lost conflict resolution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Alternative {
    pub field: ServiceField,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Service {
    pub name: Detail,
    pub product: Detail,
    pub version: Detail,
    pub extra_info: Detail,
    /// Secondary-notes trail. Never holds the value currently kept for its field.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub alternatives: BTreeSet<Alternative>,
}

impl Service {
    pub fn field(&self, field: ServiceField) -> &Detail {
        match field {
            ServiceField::Name => &self.name,
            ServiceField::Product => &self.product,
            ServiceField::Version => &self.version,
            ServiceField::ExtraInfo => &self.extra_info,
        }
    }

    pub fn field_mut(&mut self, field: ServiceField) -> &mut Detail {
        match field {
            ServiceField::Name => &mut self.name,
            ServiceField::Product => &mut self.product,
            ServiceField::Version => &mut self.version,
            ServiceField::ExtraInfo => &mut self.extra_info,
        }
    }

    pub fn alternatives_for(&self, field: ServiceField) -> impl Iterator<Item = &str> {
        self.alternatives
            .iter()
            .filter(move |alt| alt.field == field)
            .map(|alt| alt.value.as_str())
    }

    /// `10 × known fields + segments of a known version`.
    ///
    /// Conflict resolution never lowers this for a port.
    pub fn specificity(&self) -> u32 {
        let known = ServiceField::ALL
            .iter()
            .filter(|f| self.field(**f).is_known())
            .count() as u32;
        let version_detail = self.version.as_known().map(detail::segments).unwrap_or(0) as u32;
        known * 10 + version_detail
    }

    /// Known product, version and extra info joined by spaces, for pattern matching.
    pub fn banner(&self) -> String {
        [&self.product, &self.version, &self.extra_info]
            .iter()
            .filter_map(|d| d.as_known())
            .collect::<Vec<&str>>()
            .join(" ")
    }
}
