//! Restaurant data service: restaurants, their addresses, menus and menu items.

use std::convert::Infallible;

use warp::Filter;

pub mod handlers;
pub mod models;
pub mod repository;

pub use models::{Address, Menu, MenuItem, NewAddress, NewMenu, NewMenuItem, NewRestaurant, Restaurant};
pub use repository::RestaurantRepository;


fn with_repo(
    repo: RestaurantRepository,
) -> impl Filter<Extract = (RestaurantRepository,), Error = Infallible> + Clone {
    warp::any().map(move || repo.clone())
}

/// HTTP API under `/api/v2/restaurants` plus `/health`.
pub fn routes(
    repo: RestaurantRepository,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    let health = warp::path!("health").and(warp::get()).map(|| "OK");

    let list = warp::path!("api" / "v2" / "restaurants")
        .and(warp::get())
        .and(with_repo(repo.clone()))
        .and_then(handlers::list_restaurants);

    let create = warp::path!("api" / "v2" / "restaurants")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_repo(repo.clone()))
        .and_then(handlers::create_restaurant);

    let get = warp::path!("api" / "v2" / "restaurants" / i64)
        .and(warp::get())
        .and(with_repo(repo.clone()))
        .and_then(handlers::get_restaurant);

    let update = warp::path!("api" / "v2" / "restaurants" / i64)
        .and(warp::put())
        .and(warp::body::json())
        .and(with_repo(repo.clone()))
        .and_then(handlers::update_restaurant);

    let delete = warp::path!("api" / "v2" / "restaurants" / i64)
        .and(warp::delete())
        .and(with_repo(repo.clone()))
        .and_then(handlers::delete_restaurant);

    let add_menu = warp::path!("api" / "v2" / "restaurants" / i64 / "menus")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_repo(repo.clone()))
        .and_then(handlers::add_menu);

    let delete_menu = warp::path!("api" / "v2" / "restaurants" / i64 / "menus" / i64)
        .and(warp::delete())
        .and(with_repo(repo.clone()))
        .and_then(handlers::delete_menu);

    let add_menu_item = warp::path!("api" / "v2" / "restaurants" / i64 / "menus" / i64 / "items")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_repo(repo))
        .and_then(handlers::add_menu_item);

    health
        .or(list)
        .or(create)
        .or(get)
        .or(update)
        .or(delete)
        .or(add_menu)
        .or(delete_menu)
        .or(add_menu_item)
        .recover(handlers::handle_rejection)
}
