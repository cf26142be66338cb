pub mod dashboard;
pub mod employee;
pub mod payroll;
