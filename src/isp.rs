//! ISP analysis. Informational only: the aggregator never applies it.

use crate::models::IpRecord;
use crate::tables::ScoringTables;
use serde::{Deserialize, Serialize};

/// Adjustment reported for cloud and hosting networks
pub const CLOUD_PROVIDER_ADJUSTMENT: i32 = -12;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IspAssessment {
    pub adjustment: i32,
    pub risk_label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IspAnalyzer {
    risky_keywords: Vec<String>,
}

impl IspAnalyzer {
    pub fn new(tables: &ScoringTables) -> Self {
        Self {
            risky_keywords: tables.risky_isp_keywords.clone(),
        }
    }

    pub fn analyze(&self, record: &IpRecord) -> IspAssessment {
        let Some(org) = record.org() else {
            return IspAssessment::default();
        };
        let org = org.to_lowercase();

        if self.risky_keywords.iter().any(|k| org.contains(k.as_str())) {
            IspAssessment {
                adjustment: CLOUD_PROVIDER_ADJUSTMENT,
                risk_label: Some("Cloud/hosting provider".to_string()),
            }
        } else {
            IspAssessment::default()
        }
    }
}

impl Default for IspAnalyzer {
    fn default() -> Self {
        Self::new(&ScoringTables::builtin())
    }
}
