//! Smoke Screen Unit tests for cart state components
//!
//! These test are unit tests that span the codebase, testing behavior in
//! isolation from integration scenarios. These are intended as smoke-screen
//! and generally test the happy-path.
//!
#![allow(unused_imports)]

use cart_state::{
    AccessPolicy, CartError, CartId, Caller, Decision, LineItem, Operation, PolicyVariant,
    Request, Response, StateDocument, Status, Version,
    utils::{CART_ID_PREFIX, new_cart_id, new_uuid_to_bech32},
};
use serde_json::json;

// UTILS MODULE TESTS
#[cfg(test)]
mod utils_tests {
    use super::*;

    /// Test that new_uuid_to_bech32 generates valid bech32-encoded strings
    /// with the correct human-readable prefix
    #[test]
    fn generates_valid_bech32_with_hrp() {
        let encoded = new_uuid_to_bech32("cart_").unwrap();
        assert!(encoded.starts_with("cart_1"));
        assert!(encoded.len() > 10);
    }

    /// Empty prefixes are not valid bech32
    #[test]
    fn handles_empty_hrp() {
        assert!(new_uuid_to_bech32("").is_err());
    }

    /// Test that cart ids are unique and carry the cart prefix
    #[test]
    fn generates_unique_cart_ids() {
        let id1 = new_cart_id().unwrap();
        let id2 = new_cart_id().unwrap();

        assert!(id1.as_str().starts_with(CART_ID_PREFIX));
        assert_ne!(id1, id2);
    }
}

// CART MODULE TESTS
#[cfg(test)]
mod cart_tests {
    use super::*;

    /// A new line item derives its total from price and qty
    #[test]
    fn line_item_total_is_derived() {
        let item = LineItem::new("sku", 3, 250).unwrap();
        assert_eq!(item.total, 750);
    }

    /// A line item whose total does not fit is rejected
    #[test]
    fn line_item_overflow_is_rejected() {
        assert!(matches!(
            LineItem::new("sku", 2, u64::MAX),
            Err(CartError::ArithmeticOverflow(_))
        ));
    }

    /// The empty document is valid and has no items
    #[test]
    fn empty_document_is_valid() {
        let doc = StateDocument::empty();
        assert!(doc.is_empty());
        assert!(doc.validate().is_ok());
        assert_eq!(doc.computed_total().unwrap(), 0);
    }

    /// Documents deserialize from the boundary JSON shape
    #[test]
    fn document_from_json() {
        let doc: StateDocument = serde_json::from_value(json!({
            "items": [
                { "itemId": "a", "qty": 1, "price": 2, "total": 2 },
                { "itemId": "b", "qty": 2, "price": 2, "total": 4 }
            ],
            "totalSum": 6
        }))
        .unwrap();

        assert!(doc.validate().is_ok());
        assert_eq!(doc.item("b").unwrap().qty, 2);
    }
}

// POLICY MODULE TESTS
#[cfg(test)]
mod policy_tests {
    use super::*;

    /// The default policy is permissive with "developer" as privileged identity
    #[test]
    fn default_policy() {
        let policy = AccessPolicy::default();
        assert_eq!(policy.variant(), PolicyVariant::Permissive);
        assert_eq!(
            policy.decide(&Caller::identity("developer"), Operation::SetState),
            Decision::Allow
        );
        assert_eq!(
            policy.decide(&Caller::Anonymous, Operation::Update),
            Decision::Allow
        );
    }

    /// A custom privileged identity replaces "developer"
    #[test]
    fn custom_privileged_identity() {
        let policy = AccessPolicy::new("ops", PolicyVariant::Permissive);
        assert_eq!(
            policy.decide(&Caller::identity("developer"), Operation::SetState),
            Decision::Deny
        );
        assert_eq!(
            policy.decide(&Caller::identity("ops"), Operation::SetState),
            Decision::Allow
        );
    }
}

// REQUEST & RESPONSE TESTS
#[cfg(test)]
mod request_tests {
    use super::*;

    /// Conflicts map to 409 with the version message
    #[test]
    fn conflict_response() {
        let response: Response = CartError::VersionConflict {
            requested: Version(3),
            current: Version(5),
        }
        .into();

        assert_eq!(response.status.code(), 409);
        assert_eq!(
            response.body_message(),
            Some("Your state version (3) is behind the current version (5).")
        );
    }

    /// Denials map to 403
    #[test]
    fn denied_response() {
        let response: Response = CartError::AuthorizationDenied {
            operation: "setState",
        }
        .into();
        assert_eq!(response.status, Status::Forbidden);
    }

    /// Headers are looked up case-insensitively
    #[test]
    fn header_lookup() {
        let response = Response::new(Status::Ok).with_header("X-State-Version", 7);
        assert_eq!(response.header("x-state-version"), Some("7"));
        assert_eq!(response.header("etag"), None);
    }

    /// Clean requests need no body
    #[test]
    fn clean_request() {
        let request = Request::parse("clean", None).unwrap();
        assert_eq!(request.operation(), Operation::Clean);
    }

    /// Cart ids must not be empty
    #[test]
    fn cart_id_validation() {
        assert!(CartId::new("").is_err());
        assert!(CartId::new("cart_x").is_ok());
    }
}
