mod quote_api;
mod render_api;

use std::sync::Arc;

pub use quote_api::compute_quote;

use crate::api::{ParameterAPI, API};
use crate::entities::RateTable;
use crate::error::ParameterError;
use crate::params::{ParameterStore, RateSource};

pub struct Engine {
    params: ParameterStore,
}

impl Engine {
    pub fn new(params: ParameterStore) -> Self {
        Self { params }
    }
}

impl ParameterAPI for Engine {
    #[tracing::instrument(skip(self))]
    fn reload_rates(
        &self,
        rates: &RateSource,
        multipliers: Option<&RateSource>,
    ) -> Result<(), ParameterError> {
        self.params.reload(rates, multipliers)
    }

    fn rate_table(&self) -> Arc<RateTable> {
        self.params.table()
    }
}

impl API for Engine {}
