//! # Catalog Requests
//!
//! Input forms for suppliers, clients, components, recipes, products and
//! settings, with the validation each one needs before it is stored.
//!
//! Numbers arrive as text and are sanitized (blank or garbage → 0) before
//! the range rules apply; names, ids and enumerated fields are strict.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::derive_retail_prices;
use crate::types::{ClientTier, ComponentKind, Settings};
use crate::validation::{
    normalize_optional, sanitize_decimal, validate_id, validate_name, validate_non_negative,
    ValidationResult,
};

/// Maximum length of a product code.
pub const MAX_CODE_LEN: usize = 50;

// =============================================================================
// Parties
// =============================================================================

/// Contact details shared by suppliers and clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContactRequest {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub telegram: Option<String>,
}

/// Validated contact details.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidContact {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub telegram: Option<String>,
}

impl ContactRequest {
    pub fn validate(&self) -> ValidationResult<ValidContact> {
        let email = normalize_optional(self.email.clone());
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(ValidationError::InvalidFormat {
                    field: "email".to_string(),
                    reason: "must contain @".to_string(),
                });
            }
        }

        Ok(ValidContact {
            name: validate_name("name", &self.name)?,
            phone: normalize_optional(self.phone.clone()),
            email,
            telegram: normalize_optional(self.telegram.clone()),
        })
    }
}

/// A new client; `tier` defaults to wholesale when blank.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClientRequest {
    #[serde(flatten)]
    #[ts(flatten)]
    pub contact: ContactRequest,
    pub tier: Option<String>,
}

impl ClientRequest {
    pub fn validate(&self) -> ValidationResult<(ValidContact, ClientTier)> {
        let tier = match normalize_optional(self.tier.clone()) {
            Some(tier) => tier.parse()?,
            None => ClientTier::default(),
        };
        Ok((self.contact.validate()?, tier))
    }
}

// =============================================================================
// Components
// =============================================================================

/// A new component.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ComponentRequest {
    pub name: String,
    pub kind: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidComponent {
    pub name: String,
    pub kind: ComponentKind,
    pub unit: String,
}

impl ComponentRequest {
    pub fn validate(&self) -> ValidationResult<ValidComponent> {
        Ok(ValidComponent {
            name: validate_name("name", &self.name)?,
            kind: self.kind.parse()?,
            unit: validate_name("unit", &self.unit)?,
        })
    }
}

// =============================================================================
// Recipes
// =============================================================================

/// One ingredient line of a new recipe.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecipeItemRequest {
    pub component_id: String,
    pub weight: String,
    pub unit: String,
}

/// A new recipe with its items.
///
/// Output weight is only sanitized here. A recipe that cannot be expanded
/// (zero output, no items) is stored and rejected when an order uses it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecipeRequest {
    pub name: String,
    pub output_weight: String,
    pub output_unit: String,
    pub items: Vec<RecipeItemRequest>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidRecipeItem {
    pub component_id: String,
    pub weight: Decimal,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidRecipe {
    pub name: String,
    pub output_weight: Decimal,
    pub output_unit: String,
    pub items: Vec<ValidRecipeItem>,
}

impl RecipeRequest {
    pub fn validate(&self) -> ValidationResult<ValidRecipe> {
        let name = validate_name("name", &self.name)?;
        let output_weight = validate_non_negative("output weight", sanitize_decimal(&self.output_weight))?;

        let items = self
            .items
            .iter()
            .map(|item| -> ValidationResult<ValidRecipeItem> {
                Ok(ValidRecipeItem {
                    component_id: validate_id("component_id", &item.component_id)?,
                    weight: validate_non_negative("weight", sanitize_decimal(&item.weight))?,
                    unit: item.unit.trim().to_string(),
                })
            })
            .collect::<ValidationResult<Vec<_>>>()?;

        Ok(ValidRecipe {
            name,
            output_weight,
            output_unit: self.output_unit.trim().to_string(),
            items,
        })
    }
}

// =============================================================================
// Products
// =============================================================================

/// A product being created or updated.
///
/// Blank retail prices are derived from the settings in effect when the
/// product is saved.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductRequest {
    pub name: String,
    pub code: String,
    pub recipe_id: String,
    pub box_gross_weight: String,
    pub box_net_weight: String,
    pub base_price: String,
    pub retail1_price: Option<String>,
    pub retail2_price: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidProduct {
    pub name: String,
    pub code: String,
    pub recipe_id: String,
    pub box_gross_weight: Decimal,
    pub box_net_weight: Decimal,
    pub base_price: Money,
    pub retail1_price: Money,
    pub retail2_price: Money,
}

/// Parses an optional price; blank means "derive it".
fn optional_price(field: &str, raw: Option<&String>) -> ValidationResult<Option<Money>> {
    match raw.map(|s| s.trim()).filter(|s| !s.is_empty()) {
        Some(raw) => Ok(Some(Money::from_decimal(validate_non_negative(
            field,
            sanitize_decimal(raw),
        )?))),
        None => Ok(None),
    }
}

impl ProductRequest {
    pub fn validate(&self, settings: &Settings) -> CoreResult<ValidProduct> {
        let name = validate_name("name", &self.name)?;
        let code = self.code.trim().to_uppercase();
        if code.is_empty() {
            return Err(ValidationError::Required {
                field: "code".to_string(),
            }
            .into());
        }
        if code.len() > MAX_CODE_LEN {
            return Err(ValidationError::TooLong {
                field: "code".to_string(),
                max: MAX_CODE_LEN,
            }
            .into());
        }

        let base_price = Money::from_decimal(validate_non_negative(
            "base price",
            sanitize_decimal(&self.base_price),
        )?);
        let (retail1_price, retail2_price) = derive_retail_prices(
            base_price,
            optional_price("retail1 price", self.retail1_price.as_ref())?,
            optional_price("retail2 price", self.retail2_price.as_ref())?,
            settings,
        );

        Ok(ValidProduct {
            name,
            code,
            recipe_id: validate_id("recipe_id", &self.recipe_id)?,
            box_gross_weight: validate_non_negative(
                "box gross weight",
                sanitize_decimal(&self.box_gross_weight),
            )?,
            box_net_weight: validate_non_negative(
                "box net weight",
                sanitize_decimal(&self.box_net_weight),
            )?,
            base_price,
            retail1_price,
            retail2_price,
        })
    }
}

// =============================================================================
// Settings
// =============================================================================

/// New markup percentages.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettingsRequest {
    pub wholesale_markup: String,
    pub retail1_markup: String,
    pub retail2_markup: String,
}

impl SettingsRequest {
    pub fn validate(&self) -> ValidationResult<Settings> {
        Ok(Settings {
            wholesale_markup: validate_non_negative(
                "wholesale markup",
                sanitize_decimal(&self.wholesale_markup),
            )?,
            retail1_markup: validate_non_negative(
                "retail1 markup",
                sanitize_decimal(&self.retail1_markup),
            )?,
            retail2_markup: validate_non_negative(
                "retail2 markup",
                sanitize_decimal(&self.retail2_markup),
            )?,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    const RECIPE: &str = "550e8400-e29b-41d4-a716-446655440000";

    fn product_request(r1: Option<&str>) -> ProductRequest {
        ProductRequest {
            name: "Loaf".to_string(),
            code: " loaf-01 ".to_string(),
            recipe_id: RECIPE.to_string(),
            box_gross_weight: "2.2".to_string(),
            box_net_weight: "2".to_string(),
            base_price: "100".to_string(),
            retail1_price: r1.map(str::to_string),
            retail2_price: None,
        }
    }

    #[test]
    fn test_product_derives_missing_retail_prices() {
        let product = product_request(None).validate(&Settings::default()).unwrap();
        assert_eq!(product.code, "LOAF-01");
        assert_eq!(product.retail1_price, Money::from_units(140));
        assert_eq!(product.retail2_price, Money::from_units(170));
        assert_eq!(product.box_net_weight, Decimal::from(2));
    }

    #[test]
    fn test_product_blank_retail_price_is_derived() {
        let product = product_request(Some("  ")).validate(&Settings::default()).unwrap();
        assert_eq!(product.retail1_price, Money::from_units(140));

        let product = product_request(Some("150")).validate(&Settings::default()).unwrap();
        assert_eq!(product.retail1_price, Money::from_units(150));
    }

    #[test]
    fn test_product_requires_code() {
        let mut request = product_request(None);
        request.code = "   ".to_string();
        assert!(matches!(
            request.validate(&Settings::default()),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));
    }

    #[test]
    fn test_component_kind_spellings() {
        let component = ComponentRequest {
            name: "Flour".to_string(),
            kind: "Raw Material".to_string(),
            unit: "kg".to_string(),
        }
        .validate()
        .unwrap();
        assert_eq!(component.kind, ComponentKind::RawMaterial);

        let err = ComponentRequest {
            name: "Flour".to_string(),
            kind: "liquid".to_string(),
            unit: "kg".to_string(),
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ValidationError::NotAllowed { .. }));
    }

    #[test]
    fn test_recipe_keeps_zero_output_weight() {
        let recipe = RecipeRequest {
            name: "Dough".to_string(),
            output_weight: "".to_string(),
            output_unit: "kg".to_string(),
            items: vec![RecipeItemRequest {
                component_id: RECIPE.to_string(),
                weight: "0,6".to_string(),
                unit: "kg".to_string(),
            }],
        }
        .validate()
        .unwrap();

        assert_eq!(recipe.output_weight, Decimal::ZERO);
        assert_eq!(recipe.items[0].weight, Decimal::new(6, 1));
    }

    #[test]
    fn test_client_tier_defaults_to_wholesale() {
        let request = ClientRequest {
            contact: ContactRequest {
                name: "Corner Cafe".to_string(),
                ..Default::default()
            },
            tier: None,
        };
        let (_, tier) = request.validate().unwrap();
        assert_eq!(tier, ClientTier::Wholesale);

        let request = ClientRequest {
            tier: Some("retail3".to_string()),
            ..request
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_contact_email_format() {
        let request = ContactRequest {
            name: "Mill Co".to_string(),
            email: Some("mill.example".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_settings_request() {
        let settings = SettingsRequest {
            wholesale_markup: "12.5".to_string(),
            retail1_markup: "".to_string(),
            retail2_markup: "80".to_string(),
        }
        .validate()
        .unwrap();
        assert_eq!(settings.wholesale_markup, Decimal::new(125, 1));
        assert_eq!(settings.retail1_markup, Decimal::ZERO);

        let err = SettingsRequest {
            wholesale_markup: "-1".to_string(),
            ..Default::default()
        }
        .validate();
        assert!(err.is_err());
    }
}
