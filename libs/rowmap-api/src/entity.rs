use crate::coerce::CoerceOptions;
use crate::error::CoercionError;
use crate::shape::Shape;
use crate::value::Value;

/// A type rows can be materialized into.
///
/// Usually produced by `#[derive(Entity)]`. `Default` stands in for the
/// parameterless constructor: every row starts from `Self::default()`.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Default, Entity)]
/// pub struct Order {
///     pub id: i64,
///     #[member(name = "Qty")]
///     pub quantity: Option<u32>,
///     #[member(readonly)]
///     pub total: f64,
///     _total: f64,
/// }
/// ```
pub trait Entity: Default + 'static {
    fn shape() -> &'static Shape;

    /// Coerce `value` into member `member` (an index into `shape().members`)
    /// and store it. Indexes of read-only or composite members are ignored.
    fn assign(
        &mut self,
        member: usize,
        value: &Value<'_>,
        opts: &CoerceOptions,
    ) -> Result<(), CoercionError>;
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

    use super::*;
    use crate::coerce::TargetType;
    use crate::shape::Access;

    #[allow(dead_code)]
    #[derive(Debug, Default)]
    struct Address {
        city: String,
    }

    #[derive(Debug, Default, crate::Entity)]
    struct Customer {
        pub id: i64,
        #[member(name = "userName")]
        pub user_name: Option<String>,
        #[member(readonly)]
        pub balance: f64,
        #[member(name = "_balance")]
        balance_store: f64,
        pub joined: Option<NaiveDate>,
        pub avatar: Vec<u8>,
        pub address: Option<Address>,
        #[member(skip)]
        pub scratch: u32,
    }

    #[test]
    fn derive_describes_members_in_declaration_order() {
        let shape = Customer::shape();
        assert_eq!(shape.name, "Customer");

        let names: Vec<_> = shape.members.iter().map(|m| m.name).collect();
        assert_eq!(
            names,
            ["id", "userName", "balance", "_balance", "joined", "avatar", "address"]
        );

        let user_name = &shape.members[1];
        assert_eq!(user_name.target, TargetType::Text);
        assert!(user_name.nullable);
        assert_eq!(user_name.access, Access::Public);

        assert!(!shape.members[2].writable);
        assert_eq!(shape.members[3].access, Access::NonPublic);
        assert_eq!(shape.members[4].target, TargetType::Date);
        assert_eq!(shape.members[5].target, TargetType::Bytes);
        assert!(shape.members[6].target.is_composite());
        assert!(shape.members[6].nullable);
    }

    #[test]
    fn assign_coerces_into_the_indexed_member() {
        let opts = CoerceOptions::default();
        let mut customer = Customer::default();

        customer.assign(0, &Value::text("42"), &opts).unwrap();
        customer.assign(1, &Value::text("ann"), &opts).unwrap();
        customer.assign(3, &Value::Float64(9.5), &opts).unwrap();
        customer.assign(4, &Value::text("2020-01-02"), &opts).unwrap();

        assert_eq!(customer.id, 42);
        assert_eq!(customer.user_name.as_deref(), Some("ann"));
        assert_eq!(customer.balance_store, 9.5);
        assert_eq!(customer.joined, NaiveDate::from_ymd_opt(2020, 1, 2));

        let err = customer.assign(0, &Value::text("x"), &opts).unwrap_err();
        assert_eq!(err.to, "i64");
    }

    #[test]
    fn assign_ignores_readonly_and_composite_members() {
        let opts = CoerceOptions::default();
        let mut customer = Customer::default();

        customer.assign(2, &Value::Float64(1.0), &opts).unwrap();
        customer.assign(6, &Value::text("Paris"), &opts).unwrap();
        customer.assign(99, &Value::Int64(1), &opts).unwrap();

        assert_eq!(customer.balance, 0.0);
        assert!(customer.address.is_none());
        assert_eq!(customer.scratch, 0);
    }

    #[allow(dead_code)]
    #[derive(Debug, Default, crate::Entity)]
    struct Event {
        pub at: Option<DateTime<Utc>>,
        pub local_at: Option<DateTime<FixedOffset>>,
        pub zoned: chrono::DateTime<chrono::FixedOffset>,
    }

    #[test]
    fn only_utc_datetimes_are_scalar() {
        let shape = Event::shape();
        assert_eq!(shape.members[0].target, TargetType::Timestamp);
        assert!(shape.members[1].target.is_composite());
        assert!(shape.members[2].target.is_composite());

        let opts = CoerceOptions::default();
        let mut event = Event::default();
        event.assign(0, &Value::text("2024-05-06T07:08:09Z"), &opts).unwrap();
        event.assign(1, &Value::text("2024-05-06T07:08:09Z"), &opts).unwrap();

        assert!(event.at.is_some());
        assert!(event.local_at.is_none());
    }
}
