pub mod alert_table;
pub mod metric_gauge;
pub mod sparkline_panel;
