// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::Result;

use crate::aggregator::ReportModel;

pub struct JsonReportGenerator;

impl JsonReportGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, model: &ReportModel) -> Result<Vec<u8>> {
        let json = serde_json::to_string_pretty(model)?;
        Ok(json.into_bytes())
    }
}

impl Default for JsonReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}
