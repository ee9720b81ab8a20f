pub mod accounts;
pub mod analytics;
pub mod api;

use rocket::routes;

pub fn get_routes() -> Vec<rocket::Route> {
    routes![
        // API routes with /api/v1/ prefix
        api::health_check,
        api::register,
        api::login,
        api::logout,
        api::get_cache_stats,
        api::clear_cache,
        // Connected-account management
        accounts::connect_account,
        accounts::list_accounts,
        accounts::disconnect_account,
        // Per-account analytics views
        analytics::account_overview,
        analytics::account_growth,
        analytics::account_best_times,
        analytics::account_hashtags,
        analytics::account_content_intelligence,
        analytics::account_reels,
        analytics::account_posts,
        analytics::export_views,
        // Cross-account aggregate
        analytics::user_overview,
    ]
}
