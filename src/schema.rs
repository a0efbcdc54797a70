diesel::table! {
    restaurants (id) {
        id -> Uuid,
        owner_id -> Uuid,
        #[max_length = 255]
        name -> Varchar,
        #[max_length = 50]
        phone -> Varchar,
        #[max_length = 255]
        address -> Varchar,
        min_order_value -> Numeric,
        delivery_fee -> Numeric,
        is_open -> Bool,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    products (id) {
        id -> Uuid,
        restaurant_id -> Uuid,
        #[max_length = 255]
        name -> Varchar,
        price -> Numeric,
        is_available -> Bool,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    product_options (id) {
        id -> Uuid,
        product_id -> Uuid,
        #[max_length = 255]
        name -> Varchar,
        is_required -> Bool,
        min_selections -> Int4,
        max_selections -> Int4,
    }
}

diesel::table! {
    option_items (id) {
        id -> Uuid,
        option_id -> Uuid,
        #[max_length = 255]
        name -> Varchar,
        price -> Numeric,
    }
}

diesel::table! {
    ingredients (id) {
        id -> Uuid,
        restaurant_id -> Uuid,
        #[max_length = 255]
        name -> Varchar,
        #[max_length = 50]
        unit -> Varchar,
        stock_quantity -> Numeric,
        min_stock -> Numeric,
        cost_per_unit -> Numeric,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    product_ingredients (id) {
        id -> Uuid,
        product_id -> Uuid,
        ingredient_id -> Uuid,
        quantity_per_unit -> Numeric,
    }
}

diesel::table! {
    orders (id) {
        id -> Uuid,
        #[max_length = 50]
        order_number -> Varchar,
        customer_id -> Uuid,
        restaurant_id -> Uuid,
        #[max_length = 50]
        status -> Varchar,
        subtotal -> Numeric,
        delivery_fee -> Numeric,
        total -> Numeric,
        #[max_length = 255]
        delivery_address -> Varchar,
        #[max_length = 100]
        delivery_city -> Varchar,
        #[max_length = 50]
        delivery_state -> Varchar,
        #[max_length = 20]
        delivery_zip_code -> Varchar,
        #[max_length = 50]
        delivery_phone -> Varchar,
        notes -> Nullable<Text>,
        confirmed_at -> Nullable<Timestamptz>,
        preparing_at -> Nullable<Timestamptz>,
        ready_at -> Nullable<Timestamptz>,
        out_for_delivery_at -> Nullable<Timestamptz>,
        delivered_at -> Nullable<Timestamptz>,
        cancelled_at -> Nullable<Timestamptz>,
        cancellation_reason -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    order_items (id) {
        id -> Uuid,
        order_id -> Uuid,
        product_id -> Uuid,
        #[max_length = 255]
        product_name -> Varchar,
        product_price -> Numeric,
        quantity -> Int4,
        subtotal -> Numeric,
        notes -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    order_item_options (id) {
        id -> Uuid,
        order_item_id -> Uuid,
        #[max_length = 255]
        option_name -> Varchar,
        #[max_length = 255]
        item_name -> Varchar,
        item_price -> Numeric,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(products -> restaurants (restaurant_id));
diesel::joinable!(product_options -> products (product_id));
diesel::joinable!(option_items -> product_options (option_id));
diesel::joinable!(ingredients -> restaurants (restaurant_id));
diesel::joinable!(product_ingredients -> products (product_id));
diesel::joinable!(product_ingredients -> ingredients (ingredient_id));
diesel::joinable!(orders -> restaurants (restaurant_id));
diesel::joinable!(order_items -> orders (order_id));
diesel::joinable!(order_item_options -> order_items (order_item_id));

diesel::allow_tables_to_appear_in_same_query!(
    restaurants,
    products,
    product_options,
    option_items,
    ingredients,
    product_ingredients,
    orders,
    order_items,
    order_item_options,
);
