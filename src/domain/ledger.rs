//! Ledger vocabulary
//!
//! Status and type enums stored as text columns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomainError;

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(DomainError::unknown($kind, other)),
                }
            }
        }
    };
}

text_enum!(
    /// How a customer paid a bill
    PaymentType, "payment type" {
        Cash => "cash",
        Installment => "installment",
        Transfer => "transfer",
    }
);

text_enum!(
    /// Collection transaction state; `Pending` rows are the outstanding ("tunggakan") list
    TransactionStatus, "transaction status" {
        Pending => "pending",
        Completed => "completed",
        Failed => "failed",
    }
);

text_enum!(
    /// Cash-advance ("talangan") state
    TalanganStatus, "talangan status" {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Settled => "settled",
    }
);

text_enum!(
    AnomalyStatus, "anomaly status" {
        Reported => "reported",
        Investigating => "investigating",
        Resolved => "resolved",
    }
);

text_enum!(
    SettlementStatus, "settlement status" {
        Pending => "pending",
        Completed => "completed",
        Verified => "verified",
    }
);

text_enum!(
    /// Delivery state of a WhatsApp payment notice
    WaStatus, "wa status" {
        Sent => "sent",
        Delivered => "delivered",
        Read => "read",
        Failed => "failed",
    }
);
