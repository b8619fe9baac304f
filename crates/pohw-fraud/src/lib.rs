pub mod entropy;
pub mod rate_limit;
pub mod reputation;

pub use entropy::{check_entropy_discrepancy, default_tolerance};
pub use rate_limit::{check_rate_limit, default_rate_limit};
pub use reputation::{band_for_score, record_anomaly, record_confirmed_fraud, record_successful_proof};
