//! Synthetic loan-applicant generation.
//!
//! Records are produced in fixed-size batches. Each batch is written to the
//! applicant table first; the ids that insert hands back are then used to
//! build one segment-attribute row per applicant.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::errors::AppError;
use crate::models::{
    ApplicantRecord, ApplicantType, EcommerceAttributes, IndividualAttributes, InsertedApplicant,
    MsmeAttributes, SegmentBatch,
};
use crate::storage::ApplicantStore;

pub const LOAN_DURATIONS: [i32; 4] = [12, 24, 36, 48];
/// Blended risk weight above which an applicant is marked as defaulted.
pub const DEFAULT_THRESHOLD: f64 = 0.65;
/// Utilization above which the credit history flag is set.
pub const CREDIT_HISTORY_UTILIZATION: f64 = 0.7;
pub const UNBANKED_PROBABILITY: f64 = 0.3;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// 0.5 * utilization + 0.5 * debt-to-income.
pub fn risk_weight(utilization_ratio: f64, debt_to_income: f64) -> f64 {
    utilization_ratio * 0.5 + debt_to_income * 0.5
}

/// Draws one applicant. The derived flags are computed from the rounded
/// ratios that get stored, so they always agree with the persisted row.
pub fn generate_applicant<R: Rng + ?Sized>(rng: &mut R) -> ApplicantRecord {
    let applicant_type = *ApplicantType::ALL
        .choose(rng)
        .unwrap_or(&ApplicantType::Individual);
    let utilization_ratio = round_to(rng.gen_range(0.1..0.8), 4);
    let debt_to_income = round_to(rng.gen_range(0.1..0.5), 4);

    let default_status =
        i32::from(risk_weight(utilization_ratio, debt_to_income) > DEFAULT_THRESHOLD);
    let credit_history_score = i32::from(utilization_ratio > CREDIT_HISTORY_UTILIZATION);

    ApplicantRecord {
        utilization_ratio,
        debt_to_income,
        credit_history_score,
        loan_duration: *LOAN_DURATIONS.choose(rng).unwrap_or(&LOAN_DURATIONS[0]),
        age: rng.gen_range(22..60),
        is_unbanked: i32::from(rng.gen_bool(UNBANKED_PROBABILITY)),
        applicant_type,
        default_status,
    }
}

pub fn generate_batch<R: Rng + ?Sized>(rng: &mut R, size: usize) -> Vec<ApplicantRecord> {
    (0..size).map(|_| generate_applicant(rng)).collect()
}

/// Splits freshly inserted applicants by type and fills in the segment
/// attributes. MSME turnover is the only randomised attribute.
pub fn build_segment_rows<R: Rng + ?Sized>(
    rng: &mut R,
    inserted: &[InsertedApplicant],
) -> SegmentBatch {
    let mut batch = SegmentBatch::default();

    for applicant in inserted {
        let applicant_id = applicant.applicant_id;
        match applicant.applicant_type {
            ApplicantType::Msme => batch.msme.push(MsmeAttributes {
                applicant_id,
                inventory_turnover_ratio: round_to(rng.gen_range(5.0..15.0), 2),
                customer_refund_rate: 0.01,
                stockout_frequency: 1,
                sales_growth_velocity: 0.12,
                supplier_payment_delay: 2,
            }),
            ApplicantType::ECommerce => batch.ecommerce.push(EcommerceAttributes {
                applicant_id,
                essential_basket_index: 0.80,
                order_regularity_score: 0.9,
                bnpl_repayment_speed: 5,
                cancelled_order_ratio: 0.02,
            }),
            ApplicantType::Individual => batch.individual.push(IndividualAttributes {
                applicant_id,
                recharge_buffer: 7,
                emergency_fund_idx: 3.0,
                ott_sub_freq: 0.95,
            }),
        }
    }

    batch
}

/// Drives batch generation against an [`ApplicantStore`].
pub struct ApplicantGenerator<S> {
    store: S,
    rng: StdRng,
    batch_size: usize,
}

impl<S: ApplicantStore> ApplicantGenerator<S> {
    pub fn new(store: S, seed: u64, batch_size: usize) -> Self {
        Self {
            store,
            rng: StdRng::seed_from_u64(seed),
            batch_size: batch_size.max(1),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Generates and persists `total_rows` applicants, returning how many
    /// were written. The final batch is shortened when `total_rows` is not
    /// a multiple of the batch size.
    ///
    /// A storage error stops the run; batches committed before it remain.
    pub async fn generate(&mut self, total_rows: usize) -> Result<usize, AppError> {
        let mut written = 0;

        while written < total_rows {
            let size = self.batch_size.min(total_rows - written);
            let applicants = generate_batch(&mut self.rng, size);

            let inserted = self.store.insert_applicants(&applicants).await?;
            let segments = build_segment_rows(&mut self.rng, &inserted);
            if !segments.is_empty() {
                self.store.append_segments(&segments).await?;
            }

            written += inserted.len();
            tracing::info!(
                "Batch done: {} applicants ({} MSME, {} E-Commerce, {} Individual), {}/{} total",
                inserted.len(),
                segments.msme.len(),
                segments.ecommerce.len(),
                segments.individual.len(),
                written,
                total_rows
            );

            if inserted.len() != size {
                tracing::warn!(
                    "Store reported {} inserted applicants for a batch of {}",
                    inserted.len(),
                    size
                );
                if inserted.is_empty() {
                    break;
                }
            }
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applicants_respect_field_domains() {
        let mut rng = StdRng::seed_from_u64(7);

        for record in generate_batch(&mut rng, 2_000) {
            assert!((0.1..=0.8).contains(&record.utilization_ratio));
            assert!((0.1..=0.5).contains(&record.debt_to_income));
            assert!(LOAN_DURATIONS.contains(&record.loan_duration));
            assert!((22..60).contains(&record.age));
            assert!(record.is_unbanked == 0 || record.is_unbanked == 1);
            assert_eq!(
                record.default_status == 1,
                risk_weight(record.utilization_ratio, record.debt_to_income) > 0.65
            );
            assert_eq!(
                record.credit_history_score == 1,
                record.utilization_ratio > 0.7
            );
        }
    }

    #[test]
    fn ratios_are_rounded_to_four_decimals() {
        let mut rng = StdRng::seed_from_u64(11);

        for record in generate_batch(&mut rng, 200) {
            assert_eq!(round_to(record.utilization_ratio, 4), record.utilization_ratio);
            assert_eq!(round_to(record.debt_to_income, 4), record.debt_to_income);
        }
    }

    #[test]
    fn same_seed_same_batch() {
        let a = generate_batch(&mut StdRng::seed_from_u64(42), 50);
        let b = generate_batch(&mut StdRng::seed_from_u64(42), 50);

        assert_eq!(a, b);
    }

    #[test]
    fn every_type_shows_up_in_a_large_batch() {
        let batch = generate_batch(&mut StdRng::seed_from_u64(3), 1_000);

        for kind in ApplicantType::ALL {
            assert!(batch.iter().any(|r| r.applicant_type == kind));
        }
        let unbanked = batch.iter().filter(|r| r.is_unbanked == 1).count();
        assert!((200..400).contains(&unbanked), "unbanked = {}", unbanked);
    }

    #[test]
    fn segment_rows_follow_applicant_type() {
        let inserted = [
            InsertedApplicant {
                applicant_id: 10,
                applicant_type: ApplicantType::Msme,
            },
            InsertedApplicant {
                applicant_id: 11,
                applicant_type: ApplicantType::Individual,
            },
            InsertedApplicant {
                applicant_id: 12,
                applicant_type: ApplicantType::ECommerce,
            },
            InsertedApplicant {
                applicant_id: 13,
                applicant_type: ApplicantType::Msme,
            },
        ];

        let batch = build_segment_rows(&mut StdRng::seed_from_u64(1), &inserted);

        assert_eq!(batch.len(), 4);
        assert_eq!(
            batch.msme.iter().map(|r| r.applicant_id).collect::<Vec<_>>(),
            vec![10, 13]
        );
        assert_eq!(batch.individual[0].applicant_id, 11);
        assert_eq!(batch.ecommerce[0].applicant_id, 12);
        for row in &batch.msme {
            assert!((5.0..=15.0).contains(&row.inventory_turnover_ratio));
            assert_eq!(round_to(row.inventory_turnover_ratio, 2), row.inventory_turnover_ratio);
        }
    }
}
