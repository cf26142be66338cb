use derive_more::Display;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Display)]
pub enum SalaryError {
    #[display(fmt = "{} must be a finite number", field)]
    NotFinite { field: &'static str },
    #[display(fmt = "{} cannot be negative", field)]
    Negative { field: &'static str },
    /// Inputs are finite but a derived figure is not.
    #[display(fmt = "{} is too large to compute", field)]
    Overflow { field: &'static str },
}

impl SalaryError {
    pub fn field(&self) -> &'static str {
        match self {
            SalaryError::NotFinite { field }
            | SalaryError::Negative { field }
            | SalaryError::Overflow { field } => field,
        }
    }
}

impl std::error::Error for SalaryError {}

/// The three figures a salary is computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalaryInput {
    pub base_salary: f64,
    pub allowance: f64,
    pub deduction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryBreakdown {
    #[schema(example = 50000.0)]
    pub base_salary: f64,
    #[schema(example = 5000.0)]
    pub allowance: f64,
    #[schema(example = 2000.0)]
    pub deduction: f64,
    #[schema(example = 55000.0)]
    pub gross_salary: f64,
    #[schema(example = 53000.0)]
    pub net_salary: f64,
}

impl SalaryInput {
    pub fn new(base_salary: f64, allowance: f64, deduction: f64) -> Self {
        Self {
            base_salary,
            allowance,
            deduction,
        }
    }

    /// Checks every figure and reports all offending fields, in declaration order.
    pub fn validate(&self) -> Result<(), Vec<SalaryError>> {
        let errors: Vec<SalaryError> = [
            ("baseSalary", self.base_salary),
            ("allowance", self.allowance),
            ("deduction", self.deduction),
        ]
        .into_iter()
        .filter_map(|(field, value)| check_amount(field, value).err())
        .collect();
        if !errors.is_empty() {
            return Err(errors);
        }

        check_derived(&self.breakdown()).map_err(|e| vec![e])
    }

    /// Unchecked arithmetic; callers that accept outside input go through
    /// [`calculate_salary`].
    pub fn breakdown(&self) -> SalaryBreakdown {
        let gross_salary = self.base_salary + self.allowance;
        SalaryBreakdown {
            base_salary: self.base_salary,
            allowance: self.allowance,
            deduction: self.deduction,
            gross_salary,
            net_salary: gross_salary - self.deduction,
        }
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<(), SalaryError> {
    if !value.is_finite() {
        return Err(SalaryError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(SalaryError::Negative { field });
    }
    Ok(())
}

fn check_derived(breakdown: &SalaryBreakdown) -> Result<(), SalaryError> {
    if !breakdown.gross_salary.is_finite() {
        return Err(SalaryError::Overflow { field: "grossSalary" });
    }
    if !breakdown.net_salary.is_finite() {
        return Err(SalaryError::Overflow { field: "netSalary" });
    }
    Ok(())
}

/// gross = base + allowance, net = gross - deduction.
pub fn calculate_salary(input: SalaryInput) -> Result<SalaryBreakdown, SalaryError> {
    check_amount("baseSalary", input.base_salary)?;
    check_amount("allowance", input.allowance)?;
    check_amount("deduction", input.deduction)?;
    let breakdown = input.breakdown();
    check_derived(&breakdown)?;
    Ok(breakdown)
}
