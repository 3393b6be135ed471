//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have **no identity**: they are defined entirely by their
/// attribute values and are immutable once built. A tracking code or a
/// customer's contact details are value objects; an order is an entity.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct TrackingCode(String);
///
/// impl ValueObject for TrackingCode {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
