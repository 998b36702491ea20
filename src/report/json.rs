//! JSON report output

use super::Dashboard;
use std::io::{self, Write};

pub fn write<W: Write>(writer: &mut W, dashboard: &Dashboard) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, dashboard)?;
    writeln!(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::data::Table;
    use crate::filter::Selections;

    #[test]
    fn test_empty_dashboard_serializes() {
        let table = Table::default();
        let dashboard = Dashboard::build(&table, "empty.csv", &Selections::default(), &DashboardConfig::default());

        let mut out = Vec::new();
        write(&mut out, &dashboard).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["dataset"]["rows"], 0);
        assert_eq!(parsed["influencers"]["ranking"].as_array().map(Vec::len), Some(0));
        assert_eq!(parsed["selections"]["macro_trend"], "all");
    }
}
