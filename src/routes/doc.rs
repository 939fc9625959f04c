use utoipa::{
    Modify, OpenApi,
    openapi::{
        self, OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{AuthResponse, LoginRequest, RegisterRequest, RegisterResponse, VerifyCodeRequest},
        catalog::{CategoryList, CreateDishRequest, DishList, TopRatedList, UpdateDishRequest},
        orders::{
            CartLine, OrderList, OrderStatusResponse, OrderWithLines, SubmitOrderRequest,
            SubmitOrderResponse, UpdateOrderStatusRequest,
        },
        ratings::{RatingList, SubmitRatingRequest},
        users::{CreateUserRequest, UpdateUserRequest, UserList},
    },
    models::{
        Category, CategoryRef, Dish, Order, OrderLine, Rating, TopRatedDish, User, UserProfile,
        UserSummary,
    },
    response::{ApiResponse, Meta},
    routes::{auth, catalog, health, orders, params, ratings, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::verify_code,
        auth::login,
        auth::verify_token,
        catalog::list_categories,
        catalog::list_dishes_by_category,
        catalog::list_dishes,
        catalog::create_dish,
        catalog::update_dish,
        catalog::delete_dish,
        ratings::best_dishes,
        ratings::top_rated,
        ratings::list_ratings,
        ratings::submit_rating,
        ratings::delete_rating,
        orders::submit_order,
        orders::list_orders,
        orders::get_order,
        orders::get_receipt,
        orders::update_status,
        orders::delete_order,
        users::list_users,
        users::create_user,
        users::update_user,
        users::delete_user
    ),
    components(
        schemas(
            UserProfile,
            User,
            UserSummary,
            Category,
            CategoryRef,
            Dish,
            TopRatedDish,
            Rating,
            Order,
            OrderLine,
            RegisterRequest,
            RegisterResponse,
            VerifyCodeRequest,
            LoginRequest,
            AuthResponse,
            CreateDishRequest,
            UpdateDishRequest,
            CategoryList,
            DishList,
            TopRatedList,
            SubmitRatingRequest,
            RatingList,
            CartLine,
            SubmitOrderRequest,
            SubmitOrderResponse,
            OrderWithLines,
            OrderList,
            UpdateOrderStatusRequest,
            OrderStatusResponse,
            CreateUserRequest,
            UpdateUserRequest,
            UserList,
            params::OrderListQuery,
            params::TopRatedQuery,
            Meta,
            ApiResponse<AuthResponse>,
            ApiResponse<DishList>,
            ApiResponse<OrderWithLines>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, SMS verification and login"),
        (name = "Catalog", description = "Categories and dishes"),
        (name = "Ratings", description = "Dish ratings and rankings"),
        (name = "Orders", description = "Order submission and administration"),
        (name = "Users", description = "User administration"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
