pub mod calculation_service;
pub mod consolidation_service;
pub mod tax_tables;
pub mod worked_hours;
