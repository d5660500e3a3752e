use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::ServiceError;
use crate::restaurant::models::{
    Address, Menu, MenuItem, NewAddress, NewMenu, NewMenuItem, NewRestaurant, Restaurant,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS restaurants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    phone TEXT
);

CREATE TABLE IF NOT EXISTS addresses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    street TEXT NOT NULL,
    city TEXT NOT NULL,
    country TEXT NOT NULL,
    restaurant_id INTEGER NOT NULL REFERENCES restaurants(id)
);

CREATE TABLE IF NOT EXISTS menus (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    restaurant_id INTEGER NOT NULL REFERENCES restaurants(id)
);

CREATE TABLE IF NOT EXISTS menu_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    price REAL NOT NULL,
    available INTEGER NOT NULL DEFAULT 1,
    menu_id INTEGER NOT NULL REFERENCES menus(id)
);

CREATE INDEX IF NOT EXISTS idx_addresses_restaurant ON addresses(restaurant_id);
CREATE INDEX IF NOT EXISTS idx_menus_restaurant ON menus(restaurant_id);
CREATE INDEX IF NOT EXISTS idx_menu_items_menu ON menu_items(menu_id);
"#;

/// SQLite-backed store for restaurants and everything they own.
///
/// Foreign keys are enforced but carry no `ON DELETE` action, so every
/// delete removes dependent rows itself inside one transaction.
#[derive(Clone)]
pub struct RestaurantRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RestaurantRepository {
    pub fn open(path: &str) -> Result<Self, ServiceError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, ServiceError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, ServiceError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, ServiceError> {
        self.conn
            .lock()
            .map_err(|_| ServiceError::Internal("database lock poisoned".to_string()))
    }

    pub fn create_restaurant(&self, new: &NewRestaurant) -> Result<Restaurant, ServiceError> {
        new.validate()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO restaurants (name, description, phone) VALUES (?1, ?2, ?3)",
            params![new.name, new.description, new.phone],
        )?;
        let id = tx.last_insert_rowid();
        let addresses = insert_addresses(&tx, id, &new.addresses)?;
        let menus = insert_menus(&tx, id, &new.menus)?;

        tx.commit()?;
        tracing::info!(restaurant_id = id, "Restaurant created");

        Ok(Restaurant {
            id,
            name: new.name.clone(),
            description: new.description.clone(),
            phone: new.phone.clone(),
            addresses,
            menus,
        })
    }

    pub fn find_restaurant(&self, id: i64) -> Result<Option<Restaurant>, ServiceError> {
        let conn = self.lock()?;
        load_restaurant(&conn, id)
    }

    pub fn list_restaurants(&self) -> Result<Vec<Restaurant>, ServiceError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT id FROM restaurants ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut restaurants = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(restaurant) = load_restaurant(&conn, id)? {
                restaurants.push(restaurant);
            }
        }
        Ok(restaurants)
    }

    /// Replaces the restaurant's fields and its full set of addresses and
    /// menus. Children missing from `new` are deleted.
    pub fn update_restaurant(&self, id: i64, new: &NewRestaurant) -> Result<Restaurant, ServiceError> {
        new.validate()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE restaurants SET name = ?1, description = ?2, phone = ?3 WHERE id = ?4",
            params![new.name, new.description, new.phone, id],
        )?;
        if updated == 0 {
            return Err(ServiceError::NotFound(format!("restaurant {}", id)));
        }

        delete_children(&tx, id)?;
        let addresses = insert_addresses(&tx, id, &new.addresses)?;
        let menus = insert_menus(&tx, id, &new.menus)?;

        tx.commit()?;
        tracing::info!(restaurant_id = id, "Restaurant updated");

        Ok(Restaurant {
            id,
            name: new.name.clone(),
            description: new.description.clone(),
            phone: new.phone.clone(),
            addresses,
            menus,
        })
    }

    /// Deletes menu items, menus, addresses and then the restaurant.
    pub fn delete_restaurant(&self, id: i64) -> Result<(), ServiceError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        delete_children(&tx, id)?;
        let deleted = tx.execute("DELETE FROM restaurants WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(ServiceError::NotFound(format!("restaurant {}", id)));
        }

        tx.commit()?;
        tracing::info!(restaurant_id = id, "Restaurant deleted");
        Ok(())
    }

    pub fn add_menu(&self, restaurant_id: i64, new: &NewMenu) -> Result<Menu, ServiceError> {
        new.validate()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if !restaurant_exists(&tx, restaurant_id)? {
            return Err(ServiceError::NotFound(format!("restaurant {}", restaurant_id)));
        }
        let menu = insert_menu(&tx, restaurant_id, new)?;

        tx.commit()?;
        Ok(menu)
    }

    pub fn delete_menu(&self, restaurant_id: i64, menu_id: i64) -> Result<(), ServiceError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if !menu_belongs_to(&tx, restaurant_id, menu_id)? {
            return Err(ServiceError::NotFound(format!("menu {}", menu_id)));
        }
        tx.execute("DELETE FROM menu_items WHERE menu_id = ?1", params![menu_id])?;
        tx.execute("DELETE FROM menus WHERE id = ?1", params![menu_id])?;

        tx.commit()?;
        Ok(())
    }

    pub fn add_menu_item(
        &self,
        restaurant_id: i64,
        menu_id: i64,
        new: &NewMenuItem,
    ) -> Result<MenuItem, ServiceError> {
        new.validate()?;

        let conn = self.lock()?;
        if !menu_belongs_to(&conn, restaurant_id, menu_id)? {
            return Err(ServiceError::NotFound(format!("menu {}", menu_id)));
        }
        Ok(insert_menu_item(&conn, menu_id, new)?)
    }
}

fn restaurant_exists(conn: &Connection, id: i64) -> Result<bool, rusqlite::Error> {
    conn.query_row("SELECT 1 FROM restaurants WHERE id = ?1", params![id], |_| Ok(()))
        .optional()
        .map(|row| row.is_some())
}

fn menu_belongs_to(conn: &Connection, restaurant_id: i64, menu_id: i64) -> Result<bool, rusqlite::Error> {
    conn.query_row(
        "SELECT 1 FROM menus WHERE id = ?1 AND restaurant_id = ?2",
        params![menu_id, restaurant_id],
        |_| Ok(()),
    )
    .optional()
    .map(|row| row.is_some())
}

fn delete_children(conn: &Connection, restaurant_id: i64) -> Result<(), rusqlite::Error> {
    conn.execute(
        "DELETE FROM menu_items WHERE menu_id IN (SELECT id FROM menus WHERE restaurant_id = ?1)",
        params![restaurant_id],
    )?;
    conn.execute("DELETE FROM menus WHERE restaurant_id = ?1", params![restaurant_id])?;
    conn.execute("DELETE FROM addresses WHERE restaurant_id = ?1", params![restaurant_id])?;
    Ok(())
}

fn insert_addresses(
    conn: &Connection,
    restaurant_id: i64,
    addresses: &[NewAddress],
) -> Result<Vec<Address>, rusqlite::Error> {
    addresses
        .iter()
        .map(|a| {
            conn.execute(
                "INSERT INTO addresses (street, city, country, restaurant_id) VALUES (?1, ?2, ?3, ?4)",
                params![a.street, a.city, a.country, restaurant_id],
            )?;
            Ok(Address {
                id: conn.last_insert_rowid(),
                street: a.street.clone(),
                city: a.city.clone(),
                country: a.country.clone(),
                restaurant_id,
            })
        })
        .collect()
}

fn insert_menus(conn: &Connection, restaurant_id: i64, menus: &[NewMenu]) -> Result<Vec<Menu>, rusqlite::Error> {
    menus.iter().map(|m| insert_menu(conn, restaurant_id, m)).collect()
}

fn insert_menu(conn: &Connection, restaurant_id: i64, new: &NewMenu) -> Result<Menu, rusqlite::Error> {
    conn.execute(
        "INSERT INTO menus (name, description, restaurant_id) VALUES (?1, ?2, ?3)",
        params![new.name, new.description, restaurant_id],
    )?;
    let id = conn.last_insert_rowid();

    let items = new
        .items
        .iter()
        .map(|item| insert_menu_item(conn, id, item))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Menu {
        id,
        name: new.name.clone(),
        description: new.description.clone(),
        restaurant_id,
        items,
    })
}

fn insert_menu_item(conn: &Connection, menu_id: i64, new: &NewMenuItem) -> Result<MenuItem, rusqlite::Error> {
    conn.execute(
        "INSERT INTO menu_items (name, description, price, available, menu_id) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![new.name, new.description, new.price, new.available, menu_id],
    )?;

    Ok(MenuItem {
        id: conn.last_insert_rowid(),
        name: new.name.clone(),
        description: new.description.clone(),
        price: new.price,
        available: new.available,
        menu_id,
    })
}

fn load_restaurant(conn: &Connection, id: i64) -> Result<Option<Restaurant>, ServiceError> {
    let restaurant = conn
        .query_row(
            "SELECT id, name, description, phone FROM restaurants WHERE id = ?1",
            params![id],
            |row| {
                Ok(Restaurant {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    phone: row.get(3)?,
                    addresses: Vec::new(),
                    menus: Vec::new(),
                })
            },
        )
        .optional()?;

    let Some(mut restaurant) = restaurant else {
        return Ok(None);
    };

    restaurant.addresses = load_addresses(conn, id)?;
    restaurant.menus = load_menus(conn, id)?;
    Ok(Some(restaurant))
}

fn load_addresses(conn: &Connection, restaurant_id: i64) -> Result<Vec<Address>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT id, street, city, country, restaurant_id FROM addresses WHERE restaurant_id = ?1 ORDER BY id",
    )?;
    let addresses = stmt
        .query_map(params![restaurant_id], |row| {
            Ok(Address {
                id: row.get(0)?,
                street: row.get(1)?,
                city: row.get(2)?,
                country: row.get(3)?,
                restaurant_id: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(addresses)
}

fn load_menus(conn: &Connection, restaurant_id: i64) -> Result<Vec<Menu>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, restaurant_id FROM menus WHERE restaurant_id = ?1 ORDER BY id",
    )?;
    let mut menus = stmt
        .query_map(params![restaurant_id], |row| {
            Ok(Menu {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                restaurant_id: row.get(3)?,
                items: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for menu in &mut menus {
        menu.items = load_menu_items(conn, menu.id)?;
    }
    Ok(menus)
}

fn load_menu_items(conn: &Connection, menu_id: i64) -> Result<Vec<MenuItem>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, price, available, menu_id FROM menu_items WHERE menu_id = ?1 ORDER BY id",
    )?;
    let items = stmt
        .query_map(params![menu_id], |row| {
            Ok(MenuItem {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                price: row.get(3)?,
                available: row.get(4)?,
                menu_id: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}
