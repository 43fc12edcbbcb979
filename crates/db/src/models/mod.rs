pub mod address;
pub mod cart_item;
pub mod payment_method;
pub mod product;
pub mod subscription;
pub mod wishlist_item;
