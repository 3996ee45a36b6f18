//! Diesel table definitions.
//!
//! One cart row per user (`carts.user_id` unique), one item row per
//! `(cart_id, product_id)` pair. Password hashes are stored in the encoded
//! `salt$digest` form.

diesel::table! {
    users (id) {
        id -> Uuid,
        #[max_length = 50]
        username -> Varchar,
        #[max_length = 50]
        email -> Varchar,
        #[max_length = 150]
        first_name -> Varchar,
        #[max_length = 150]
        last_name -> Varchar,
        password_hash -> Text,
        is_staff -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    products (id) {
        id -> Uuid,
        #[max_length = 150]
        name -> Varchar,
        description -> Text,
        price -> Numeric,
        #[max_length = 100]
        category -> Nullable<Varchar>,
        image_url -> Nullable<Text>,
        is_available -> Bool,
        created_at -> Timestamptz,
        modified_at -> Timestamptz,
    }
}

diesel::table! {
    carts (id) {
        id -> Uuid,
        user_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    cart_items (id) {
        id -> Uuid,
        cart_id -> Uuid,
        product_id -> Uuid,
        quantity -> Int4,
        unit_price -> Numeric,
    }
}

diesel::joinable!(carts -> users (user_id));
diesel::joinable!(cart_items -> carts (cart_id));
diesel::joinable!(cart_items -> products (product_id));

diesel::allow_tables_to_appear_in_same_query!(users, products, carts, cart_items);
