//! Dummy payment gateway
//!
//! Stands in for a real payment provider. The stub itself cannot fail, but
//! callers must treat `create_payment` as fallible: that is the contract a
//! real gateway integration will be swapped in against.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Default)]
pub struct PaymentGateway;

#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatus {
    pub id: String,
    pub status: String,
    pub updated: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("payment was declined")]
    Declined,
}

impl PaymentGateway {
    pub fn create_payment(&self, amount: Decimal, currency: Option<&str>) -> Result<Payment, PaymentError> {
        let currency = currency.unwrap_or("usd").to_string();
        let now = Utc::now();
        tracing::info!(%amount, %currency, "creating dummy payment");
        Ok(Payment {
            id: format!("DUMMY_{}", now.timestamp_millis()),
            amount,
            currency,
            status: "succeeded".to_string(),
            created: now,
        })
    }

    pub fn get_payment_status(&self, payment_id: &str) -> Result<PaymentStatus, PaymentError> {
        Ok(PaymentStatus {
            id: payment_id.to_string(),
            status: "succeeded".to_string(),
            updated: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_payment_shape() {
        let p = PaymentGateway.create_payment(Decimal::new(2599, 2), None).unwrap();
        assert!(p.id.starts_with("DUMMY_"));
        assert_eq!(p.amount, Decimal::new(2599, 2));
        assert_eq!(p.currency, "usd");
        assert_eq!(p.status, "succeeded");
    }

    #[test]
    fn test_currency_echoed() {
        let p = PaymentGateway.create_payment(Decimal::ONE, Some("eur")).unwrap();
        assert_eq!(p.currency, "eur");
    }

    #[test]
    fn test_payment_status() {
        let s = PaymentGateway.get_payment_status("DUMMY_42").unwrap();
        assert_eq!(s.id, "DUMMY_42");
        assert_eq!(s.status, "succeeded");
    }
}
