//! Field-level update planning.

use authsync_core::{
    AuthMethodOption, AuthMethodRecord, Field, FieldDescriptor, descriptors_for, keys,
};

use crate::error::ReconcileError;

/// Options an update has to send, in descriptor order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    pub options: Vec<AuthMethodOption>,
}

impl UpdatePlan {
    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Fields touched by the plan.
    pub fn changed_fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.options.iter().map(AuthMethodOption::field)
    }
}

/// Rejects changes to fields that are fixed after create.
///
/// # Errors
///
/// Returns `ImmutableFieldChanged` naming the first offending field.
pub fn check_immutable(
    previous: &AuthMethodRecord,
    desired: &AuthMethodRecord,
) -> Result<(), ReconcileError> {
    if previous.scope_id != desired.scope_id {
        return Err(ReconcileError::immutable(keys::SCOPE_ID, &desired.scope_id));
    }
    if previous.method_type() != desired.method_type() {
        return Err(ReconcileError::immutable(
            keys::TYPE,
            desired.method_type().as_str(),
        ));
    }
    Ok(())
}

/// Builds update options for every field `is_changed` reports.
///
/// A changed field that is unset on `desired` is reset to the service
/// default; otherwise its new value is set.
pub fn diff_fields(
    desired: &AuthMethodRecord,
    mut is_changed: impl FnMut(&FieldDescriptor) -> bool,
) -> UpdatePlan {
    let options = descriptors_for(desired.method_type())
        .filter(|d| is_changed(d))
        .map(|d| d.set_option(desired).unwrap_or_else(|| d.default_option()))
        .collect();
    UpdatePlan { options }
}

/// Plans the update from `previous` to `desired` without touching the
/// network.
///
/// # Errors
///
/// Returns `ImmutableFieldChanged` if scope or type differ.
pub fn plan_update(
    previous: &AuthMethodRecord,
    desired: &AuthMethodRecord,
) -> Result<UpdatePlan, ReconcileError> {
    check_immutable(previous, desired)?;
    Ok(diff_fields(desired, |d| d.differs(previous, desired)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use authsync_core::{AuthMethodAttributes, FieldValue, OidcAttributes, PasswordAttributes};

    fn oidc(attrs: OidcAttributes) -> AuthMethodRecord {
        AuthMethodRecord::new("global", AuthMethodAttributes::Oidc(attrs))
    }

    #[test]
    fn test_identical_records_plan_nothing() {
        let record = oidc(OidcAttributes {
            issuer: Some("https://idp.example.com".to_string()),
            max_age: Some(60),
            ..Default::default()
        });
        assert!(plan_update(&record, &record.clone()).unwrap().is_empty());
    }

    #[test]
    fn test_single_changed_field() {
        let previous = oidc(OidcAttributes {
            issuer: Some("https://idp.example.com".to_string()),
            ..Default::default()
        });
        let mut desired = previous.clone();
        if let AuthMethodAttributes::Oidc(o) = &mut desired.attributes {
            o.max_age = Some(3600);
        }

        let plan = plan_update(&previous, &desired).unwrap();
        assert_eq!(
            plan.options,
            vec![AuthMethodOption::set(Field::OidcMaxAge, FieldValue::Uint(3600))]
        );
    }

    #[test]
    fn test_unset_field_resets_to_default() {
        let previous = AuthMethodRecord::new(
            "global",
            AuthMethodAttributes::Password(PasswordAttributes {
                min_login_name_length: Some(5),
                min_password_length: Some(12),
            }),
        )
        .with_description("old");
        let desired = AuthMethodRecord::new(
            "global",
            AuthMethodAttributes::Password(PasswordAttributes {
                min_login_name_length: Some(5),
                min_password_length: None,
            }),
        );

        let plan = plan_update(&previous, &desired).unwrap();
        assert_eq!(
            plan.options,
            vec![
                AuthMethodOption::Default(Field::Description),
                AuthMethodOption::Default(Field::MinPasswordLength),
            ]
        );
    }

    #[test]
    fn test_trimmed_sets_ignore_whitespace_and_order() {
        let previous = oidc(OidcAttributes {
            ca_certificates: Some(vec!["A".to_string(), "B".to_string()]),
            allowed_audiences: Some(vec!["web".to_string()]),
            ..Default::default()
        });
        let desired = oidc(OidcAttributes {
            ca_certificates: Some(vec!["B\n".to_string(), " A ".to_string()]),
            allowed_audiences: Some(vec!["web ".to_string()]),
            ..Default::default()
        });
        assert!(plan_update(&previous, &desired).unwrap().is_empty());
    }

    #[test]
    fn test_signing_algorithms_are_ordered() {
        let previous = oidc(OidcAttributes {
            signing_algorithms: Some(vec!["RS256".to_string(), "ES256".to_string()]),
            ..Default::default()
        });
        let desired = oidc(OidcAttributes {
            signing_algorithms: Some(vec!["ES256".to_string(), "RS256".to_string()]),
            ..Default::default()
        });
        let plan = plan_update(&previous, &desired).unwrap();
        assert_eq!(plan.changed_fields().collect::<Vec<_>>(), vec![Field::OidcSigningAlgorithms]);
    }

    #[test]
    fn test_immutable_fields() {
        let previous = oidc(OidcAttributes::default());
        let mut desired = previous.clone();
        desired.scope_id = "o_1234567890".to_string();
        assert!(matches!(
            plan_update(&previous, &desired),
            Err(ReconcileError::ImmutableFieldChanged { field: "scope_id", .. })
        ));

        let desired = AuthMethodRecord::new(
            "global",
            AuthMethodAttributes::Password(PasswordAttributes::default()),
        );
        assert!(matches!(
            plan_update(&previous, &desired),
            Err(ReconcileError::ImmutableFieldChanged { field: "type", .. })
        ));
    }

    #[test]
    fn test_diff_with_host_change_tracking() {
        let desired = oidc(OidcAttributes {
            client_secret: Some("rotated".to_string()),
            ..Default::default()
        });
        let plan = diff_fields(&desired, |d| d.field == Field::OidcClientSecret);
        assert_eq!(
            plan.options,
            vec![AuthMethodOption::set(
                Field::OidcClientSecret,
                FieldValue::Str("rotated".to_string())
            )]
        );
    }
}
