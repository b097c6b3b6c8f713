use std::fmt;
use std::str::FromStr;

// ============ Applicant Models ============

/// Applicant category. Decides which segment table carries the extra attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicantType {
    Individual,
    Msme,
    ECommerce,
}

impl ApplicantType {
    pub const ALL: [ApplicantType; 3] = [
        ApplicantType::Individual,
        ApplicantType::Msme,
        ApplicantType::ECommerce,
    ];

    /// The value stored in `tbl_applicants.applicant_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicantType::Individual => "Individual",
            ApplicantType::Msme => "MSME",
            ApplicantType::ECommerce => "E-Commerce",
        }
    }
}

impl fmt::Display for ApplicantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Individual" => Ok(ApplicantType::Individual),
            "MSME" => Ok(ApplicantType::Msme),
            "E-Commerce" => Ok(ApplicantType::ECommerce),
            other => Err(format!("Unknown applicant type: {}", other)),
        }
    }
}

/// A synthetic loan applicant, before the database assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicantRecord {
    /// Revolving credit used over credit available, rounded to 4 decimals.
    pub utilization_ratio: f64,
    /// Monthly debt over monthly income, rounded to 4 decimals.
    pub debt_to_income: f64,
    /// 1 when utilization is above 0.7.
    pub credit_history_score: i32,
    /// Loan term in months.
    pub loan_duration: i32,
    pub age: i32,
    /// 1 when the applicant has no bank account.
    pub is_unbanked: i32,
    pub applicant_type: ApplicantType,
    /// 1 when the blended risk weight exceeds the default threshold.
    pub default_status: i32,
}

/// Id and type of a row just written to `tbl_applicants`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedApplicant {
    pub applicant_id: i32,
    pub applicant_type: ApplicantType,
}

// ============ Segment Attribute Models ============

/// Row of `tbl_msme_attributes`.
#[derive(Debug, Clone, PartialEq)]
pub struct MsmeAttributes {
    pub applicant_id: i32,
    pub inventory_turnover_ratio: f64,
    pub customer_refund_rate: f64,
    pub stockout_frequency: i32,
    pub sales_growth_velocity: f64,
    pub supplier_payment_delay: i32,
}

/// Row of `tbl_ecommerce_attributes`.
#[derive(Debug, Clone, PartialEq)]
pub struct EcommerceAttributes {
    pub applicant_id: i32,
    pub essential_basket_index: f64,
    pub order_regularity_score: f64,
    pub bnpl_repayment_speed: i32,
    pub cancelled_order_ratio: f64,
}

/// Row of `tbl_individual_attributes`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndividualAttributes {
    pub applicant_id: i32,
    pub recharge_buffer: i32,
    pub emergency_fund_idx: f64,
    pub ott_sub_freq: f64,
}

/// Segment rows derived from one batch of inserted applicants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentBatch {
    pub msme: Vec<MsmeAttributes>,
    pub ecommerce: Vec<EcommerceAttributes>,
    pub individual: Vec<IndividualAttributes>,
}

impl SegmentBatch {
    pub fn len(&self) -> usize {
        self.msme.len() + self.ecommerce.len() + self.individual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
