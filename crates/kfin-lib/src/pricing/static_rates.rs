//! Fixed rates taken from configuration

use async_trait::async_trait;

use super::{PricingError, PricingProvider, UsageRates};
use crate::config::PricingConfig;

/// Provider returning configured constants verbatim
#[derive(Debug, Clone)]
pub struct StaticProvider {
    rates: UsageRates,
}

impl StaticProvider {
    pub fn new(cpu_per_core_hour: f64, mem_per_gb_hour: f64) -> Self {
        Self {
            rates: UsageRates {
                cpu_per_core_hour,
                mem_per_gb_hour,
            },
        }
    }

    pub fn from_config(config: &PricingConfig) -> Self {
        Self {
            rates: UsageRates::from(&config.cloud),
        }
    }

    pub fn rates(&self) -> UsageRates {
        self.rates
    }
}

#[async_trait]
impl PricingProvider for StaticProvider {
    async fn resolve(&self) -> Result<UsageRates, PricingError> {
        Ok(self.rates)
    }

    fn source_label(&self) -> &'static str {
        "config"
    }
}
