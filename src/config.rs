//! Configuration options for a parameter store.
//!
//! The year horizon and the last known year come from the
//! [`Definitions`](crate::schema::Definitions); everything else that a
//! deployment may want to rename or tune lives here.

use std::collections::BTreeSet;

/// Configuration options for [`TaxParams`](crate::TaxParams).
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Name of the CPI offset parameter. Default: "CPI_offset"
    pub cpi_offset_param: String,

    /// Suffix of payload keys that change an indexed status. Default: "-indexed"
    pub indexed_suffix: String,

    /// Parameters that grow with wages instead of prices.
    /// Default: SS_Earnings_c, SS_Earnings_thd
    pub wage_indexed: BTreeSet<String>,

    /// Decimal digits kept in price-inflation rates. Default: 4
    pub rate_precision: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cpi_offset_param: "CPI_offset".to_string(),
            indexed_suffix: "-indexed".to_string(),
            wage_indexed: ["SS_Earnings_c", "SS_Earnings_thd"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rate_precision: 4,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different CPI offset parameter.
    pub fn with_cpi_offset_param(mut self, name: &str) -> Self {
        self.cpi_offset_param = name.to_string();
        self
    }

    pub fn with_indexed_suffix(mut self, suffix: &str) -> Self {
        self.indexed_suffix = suffix.to_string();
        self
    }

    pub fn with_wage_indexed<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wage_indexed = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rate_precision(mut self, digits: u32) -> Self {
        self.rate_precision = digits;
        self
    }

    /// Base parameter name of an indexed-status key, e.g. `II_em` for
    /// `II_em-indexed`.
    pub fn indexed_base<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_suffix(self.indexed_suffix.as_str())
            .filter(|base| !base.is_empty())
    }
}
