use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub addresses: Vec<Address>,
    pub menus: Vec<Menu>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    pub street: String,
    pub city: String,
    pub country: String,
    pub restaurant_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub restaurant_id: i64,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub available: bool,
    pub menu_id: i64,
}

/// Payload for creating or replacing a restaurant with its children.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRestaurant {
    pub name: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub addresses: Vec<NewAddress>,
    #[serde(default)]
    pub menus: Vec<NewMenu>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAddress {
    pub street: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMenu {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<NewMenuItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMenuItem {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

fn require_name(kind: &str, name: &str) -> Result<(), ServiceError> {
    if name.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{} name must not be blank", kind)));
    }
    Ok(())
}

impl NewRestaurant {
    pub fn validate(&self) -> Result<(), ServiceError> {
        require_name("restaurant", &self.name)?;
        self.menus.iter().try_for_each(NewMenu::validate)
    }
}

impl NewMenu {
    pub fn validate(&self) -> Result<(), ServiceError> {
        require_name("menu", &self.name)?;
        self.items.iter().try_for_each(NewMenuItem::validate)
    }
}

impl NewMenuItem {
    pub fn validate(&self) -> Result<(), ServiceError> {
        require_name("menu item", &self.name)?;
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ServiceError::Validation(format!(
                "price of {} must be a non-negative number",
                self.name
            )));
        }
        Ok(())
    }
}
