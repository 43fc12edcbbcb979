use std::{fs, path::Path};

use ts_rs::TS;

fn generate_types_content() -> String {
    let decls = [
        db::models::product::ProductKind::decl(),
        db::models::product::Product::decl(),
        db::models::cart_item::CartLineItem::decl(),
        db::models::wishlist_item::WishlistItem::decl(),
        db::models::address::Address::decl(),
        db::models::address::CreateAddress::decl(),
        db::models::payment_method::PaymentMethod::decl(),
        db::models::payment_method::CreatePaymentMethod::decl(),
        db::models::subscription::Subscription::decl(),
        services::services::cart::AddToCart::decl(),
        services::services::cart::QuickAdd::decl(),
        services::services::cart::CartSummary::decl(),
        services::services::wishlist::AddToWishlist::decl(),
        services::services::wishlist::WishlistEntry::decl(),
        services::services::auth::AuthUser::decl(),
        services::services::auth::AuthSession::decl(),
        services::services::auth::LoginRequest::decl(),
        services::services::auth::RegisterRequest::decl(),
        services::services::content::Notification::decl(),
        services::services::content::OrderLine::decl(),
        services::services::content::Order::decl(),
        services::services::content::PolicySection::decl(),
        services::services::content::PolicyDocument::decl(),
        services::services::content::Banner::decl(),
        services::services::content::HomeContent::decl(),
        server::routes::cart::CartMutationResponse::decl(),
        server::routes::cart::CartResponse::decl(),
        server::routes::cart::CartCountResponse::decl(),
        server::routes::cart::QuickAddResponse::decl(),
        server::routes::cart::UpdateCartItem::decl(),
        server::routes::catalog::DressesResponse::decl(),
        server::routes::catalog::TopsResponse::decl(),
        server::routes::account::SubscribeRequest::decl(),
        server::routes::health::HealthStatus::decl(),
        utils::response::ApiResponse::<()>::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|d| {
            let trimmed = d.trim_start();
            if trimmed.starts_with("export") {
                d
            } else {
                format!("export {trimmed}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "// This file was generated by `generate_types`. Do not edit it by hand.\n\n{body}\n"
    )
}

fn main() {
    let check_mode = std::env::args().any(|arg| arg == "--check");
    let shared_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../shared");
    let types_path = shared_path.join("types.ts");
    let generated = generate_types_content();

    if check_mode {
        match fs::read_to_string(&types_path) {
            Ok(current) if current == generated => {
                println!("shared/types.ts is up to date.");
            }
            _ => {
                eprintln!("shared/types.ts is out of date. Run `cargo run --bin generate_types`.");
                std::process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = fs::create_dir_all(&shared_path).and_then(|_| fs::write(&types_path, generated)) {
        eprintln!("Failed to write {}: {e}", types_path.display());
        std::process::exit(1);
    }
    println!("Wrote {}", types_path.display());
}
