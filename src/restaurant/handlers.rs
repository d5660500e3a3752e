use std::convert::Infallible;

use hyper::StatusCode;
use warp::{Rejection, Reply};

use crate::errors::ServiceError;
use crate::restaurant::models::{NewMenu, NewMenuItem, NewRestaurant};
use crate::restaurant::repository::RestaurantRepository;

fn reject(e: ServiceError) -> Rejection {
    warp::reject::custom(e)
}

pub async fn list_restaurants(repo: RestaurantRepository) -> Result<impl Reply, Rejection> {
    let restaurants = repo.list_restaurants().map_err(reject)?;
    Ok(warp::reply::json(&restaurants))
}

pub async fn create_restaurant(
    new: NewRestaurant,
    repo: RestaurantRepository,
) -> Result<impl Reply, Rejection> {
    let restaurant = repo.create_restaurant(&new).map_err(reject)?;
    Ok(warp::reply::with_status(
        warp::reply::json(&restaurant),
        StatusCode::CREATED,
    ))
}

pub async fn get_restaurant(id: i64, repo: RestaurantRepository) -> Result<impl Reply, Rejection> {
    match repo.find_restaurant(id).map_err(reject)? {
        Some(restaurant) => Ok(warp::reply::json(&restaurant)),
        None => Err(reject(ServiceError::NotFound(format!("restaurant {}", id)))),
    }
}

pub async fn update_restaurant(
    id: i64,
    new: NewRestaurant,
    repo: RestaurantRepository,
) -> Result<impl Reply, Rejection> {
    let restaurant = repo.update_restaurant(id, &new).map_err(reject)?;
    Ok(warp::reply::json(&restaurant))
}

pub async fn delete_restaurant(id: i64, repo: RestaurantRepository) -> Result<impl Reply, Rejection> {
    repo.delete_restaurant(id).map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_menu(
    restaurant_id: i64,
    new: NewMenu,
    repo: RestaurantRepository,
) -> Result<impl Reply, Rejection> {
    let menu = repo.add_menu(restaurant_id, &new).map_err(reject)?;
    Ok(warp::reply::with_status(warp::reply::json(&menu), StatusCode::CREATED))
}

pub async fn delete_menu(
    restaurant_id: i64,
    menu_id: i64,
    repo: RestaurantRepository,
) -> Result<impl Reply, Rejection> {
    repo.delete_menu(restaurant_id, menu_id).map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_menu_item(
    restaurant_id: i64,
    menu_id: i64,
    new: NewMenuItem,
    repo: RestaurantRepository,
) -> Result<impl Reply, Rejection> {
    let item = repo
        .add_menu_item(restaurant_id, menu_id, &new)
        .map_err(reject)?;
    Ok(warp::reply::with_status(warp::reply::json(&item), StatusCode::CREATED))
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, error, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not_found", "Not Found".to_string())
    } else if let Some(e) = err.find::<ServiceError>() {
        match e {
            ServiceError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{} not found", what),
            ),
            ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg.clone()),
            ServiceError::Database(db) => {
                tracing::error!("Database error: {}", db);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            ServiceError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        }
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, "invalid_request", e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "method_not_allowed",
            "Method not allowed".to_string(),
        )
    } else {
        tracing::error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "An internal error occurred".to_string(),
        )
    };

    let body = serde_json::json!({
        "error": error,
        "message": message,
    });
    Ok(warp::reply::with_status(warp::reply::json(&body), code))
}
