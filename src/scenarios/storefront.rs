use crate::locator::{Locator, Strategy, Target};
use crate::scenario::{CountExpectation, Scenario, Step};

const HOME: &str = "${storefront_url}";

fn link(name: &str) -> Target {
    Target::role("link", name)
}

fn button(name: &str) -> Target {
    Target::role("button", name)
}

/// The navbar cart link; a plain substring would also hit "Add to cart".
fn cart_link() -> Target {
    Target::locator(Locator::role_exact("link", "Cart"))
}

fn text(value: &str) -> Target {
    Target::text(value)
}

fn click_and_load(target: Target) -> Step {
    Step::ClickAndWaitForLoad {
        target,
        timeout_ms: None,
    }
}

fn expect_text(target: Target, contains: &str) -> Step {
    Step::ExpectText {
        target,
        contains: contains.to_string(),
        timeout_ms: None,
    }
}

/// Close a modal unless it already closed by itself.
fn dismiss_modal(modal: &str) -> Vec<Step> {
    vec![
        Step::AnyOf {
            steps: vec![
                Step::ExpectHidden {
                    target: Target::css(modal),
                    timeout_ms: Some(1000),
                },
                Step::click(Target::css(format!("{} .btn-secondary", modal))),
            ],
        },
        Step::expect_hidden(Target::css(modal)),
    ]
}

fn signup(username: &str, password: &str, dialog: &str) -> Vec<Step> {
    vec![
        Step::click(link("Sign up")),
        Step::expect_visible(Target::css("#signInModal")),
        Step::fill(Target::role("textbox", "Username:"), username),
        Step::fill(Target::role("textbox", "Password:"), password),
        Step::click(button("Sign up")),
        Step::wait_for_dialog(dialog),
    ]
}

fn login(username: &str, password: &str) -> Vec<Step> {
    vec![
        Step::click(link("Log in")),
        Step::expect_visible(Target::css("#logInModal")),
        Step::fill(Target::css("#loginusername"), username),
        Step::fill(Target::css("#loginpassword"), password),
        Step::click(button("Log in")),
        Step::expect_hidden(Target::css("#logInModal")),
    ]
}

fn add_to_cart() -> Vec<Step> {
    vec![
        Step::click(link("Add to cart")),
        Step::wait_for_dialog("Product added"),
    ]
}

fn place_order(name: &str, country: &str, city: &str, month: &str, year: &str) -> Vec<Step> {
    vec![
        Step::click(button("Place Order")),
        Step::expect_visible(Target::css("#name")),
        Step::fill(Target::css("#name"), name),
        Step::fill(Target::css("#country"), country),
        Step::fill(Target::css("#city"), city),
        Step::fill(Target::css("#card"), "4111111111111111"),
        Step::fill(Target::css("#month"), month),
        Step::fill(Target::css("#year"), year),
        Step::click(button("Purchase")),
        Step::expect_visible(Target::css(".sweet-alert").within(15_000)),
    ]
}

fn with_steps(scenario: Scenario, steps: Vec<Step>) -> Scenario {
    steps.into_iter().fold(scenario, Scenario::step)
}

pub fn signup_login_contact() -> Scenario {
    let mut steps = vec![Step::goto(HOME)];
    steps.extend(signup("${username}", "${password}", "Sign up successful"));
    steps.extend(dismiss_modal("#signInModal"));
    // Same user again: the store must refuse it
    steps.extend(signup("${username}", "${password}", "already exist"));
    steps.extend(dismiss_modal("#signInModal"));
    steps.extend(login("${username}", "${password}"));
    steps.extend([
        Step::expect_visible(link("Welcome ${username}")),
        Step::click(link("Contact")),
        Step::expect_visible(Target::css("#exampleModal")),
        Step::fill(Target::css("#recipient-email"), "test@test.com"),
        Step::fill(
            Target::first_of(
                "contact name",
                vec![
                    Strategy::new(Locator::css("#recipient-name")),
                    Strategy::new(Locator::role_named("textbox", "Contact Name:")),
                ],
            ),
            "Test User",
        ),
        Step::fill(
            Target::first_of(
                "message",
                vec![
                    Strategy::new(Locator::css("#message-text")),
                    Strategy::new(Locator::role_named("textbox", "Message:")),
                ],
            ),
            "Test message",
        ),
        Step::click(button("Send message")),
        Step::wait_for_dialog("Thanks for the message"),
        Step::expect_hidden(Target::css("#exampleModal")),
    ]);

    with_steps(
        Scenario::new(
            "storefront-signup-login-contact",
            "Sign up, get refused as a duplicate, log in and send a contact message",
        )
        .tag("storefront")
        .tag("auth")
        .var("username", "testuser_${run_id}")
        .var("password", "test123"),
        steps,
    )
}

pub fn browse_cart() -> Scenario {
    let mut steps = vec![
        Step::goto(HOME),
        Step::click(link("Laptops")),
        Step::expect_visible(text("Sony vaio i5")),
        Step::click(link("Monitors")),
        Step::expect_visible(text("Apple monitor 24")),
        Step::goto(HOME),
        Step::click(link("Laptops")),
        Step::click(link("Sony vaio i5")),
        Step::expect_visible(text("ultraportable laptop")),
        Step::expect_visible(text("790")),
        Step::expect_visible(link("Add to cart")),
    ];
    steps.extend(add_to_cart());
    steps.extend([
        click_and_load(cart_link()),
        Step::expect_visible(text("Sony vaio i5")),
        Step::expect_visible(text("790")),
        Step::click(link("Delete")),
        Step::expect_hidden(text("Sony vaio i5")),
    ]);

    with_steps(
        Scenario::new(
            "storefront-browse-cart",
            "Browse categories, add a laptop to the cart and delete it again",
        )
        .tag("storefront")
        .tag("cart"),
        steps,
    )
}

pub fn cart_remove_item() -> Scenario {
    let rows = Locator::css("#tbodyid tr");
    let mut steps = vec![
        Step::goto(HOME),
        Step::click(link("Laptops")),
        Step::expect_visible(Target::css("#tbodyid")),
        Step::expect_visible(text("Sony vaio i5")),
        Step::click(link("Monitors")),
        Step::expect_visible(Target::css("#tbodyid")),
        Step::expect_visible(text("Apple monitor 24")),
        Step::click(link("Apple monitor 24")),
        Step::expect_visible(Target::css(".product-content")),
        Step::expect_visible(text(
            "LED Cinema Display features a 27-inch glossy LED-backlit TFT",
        )),
        Step::expect_visible(Target::locator(Locator::role_matching("heading", r"\$400"))),
    ];
    steps.extend(add_to_cart());
    steps.extend([
        click_and_load(cart_link()),
        Step::expect_visible(Target::css("#tbodyid")),
        Step::expect_visible(Target::locator(Locator::css_with_text(
            "tr",
            "Apple monitor 24",
        ))),
        Step::expect_visible(Target::locator(Locator::role_exact("cell", "400"))),
        Step::RememberCount {
            locator: rows.clone(),
            key: "cart_rows".to_string(),
        },
        Step::click(link("Delete")),
        Step::ExpectCount {
            locator: rows,
            count: CountExpectation::Relative {
                key: "cart_rows".to_string(),
                delta: -1,
            },
            timeout_ms: None,
        },
        Step::expect_hidden(text("Apple monitor 24")),
    ]);

    with_steps(
        Scenario::new(
            "storefront-cart-remove-item",
            "Add a monitor to the cart and see the row count drop by one on delete",
        )
        .tag("storefront")
        .tag("cart"),
        steps,
    )
}

pub fn purchase_new_user() -> Scenario {
    let mut steps = vec![Step::goto(HOME), Step::ClearStorage];
    steps.extend(signup("${username}", "${password}", "Sign up successful"));
    steps.extend(dismiss_modal("#signInModal"));
    steps.extend(login("${username}", "${password}"));
    steps.extend([
        Step::expect_visible(text("Welcome ${username}")),
        Step::click(link("Phones")),
        Step::expect_visible(Target::css("#tbodyid")),
        Step::click(link("Samsung galaxy s6")),
        Step::expect_visible(Target::css(".product-content")),
    ]);
    steps.extend(add_to_cart());
    steps.extend([
        click_and_load(cart_link()),
        Step::expect_visible(Target::css("#tbodyid").within(10_000)),
        Step::expect_visible(text("Samsung galaxy s6")),
    ]);
    steps.extend(place_order(
        "Test User",
        "Test Country",
        "Test City",
        "11",
        "2025",
    ));
    steps.extend([
        Step::expect_visible(text("Thank you for your purchase!")),
        Step::click(Target::locator(Locator::role_exact("button", "OK"))),
    ]);

    with_steps(
        Scenario::new(
            "storefront-purchase-new-user",
            "Register a fresh user, log in and buy a phone",
        )
        .tag("storefront")
        .tag("purchase")
        .var("username", "user_${run_id}")
        .var("password", "test_pass"),
        steps,
    )
}

pub fn smoke_purchase() -> Scenario {
    let mut steps = vec![
        Step::goto(format!("{}/", HOME)),
        click_and_load(Target::css("#tbodyid .card-title a")),
        Step::click(text("Add to cart")),
        Step::wait_for_dialog("Product added"),
        click_and_load(Target::css("a[href=\"cart.html\"]")),
    ];
    steps.extend(place_order(
        "Playwright Test User",
        "Testland",
        "Testville",
        "01",
        "2030",
    ));
    steps.push(expect_text(Target::css(".sweet-alert"), "Thank you"));

    with_steps(
        Scenario::new(
            "storefront-smoke-purchase",
            "Buy the first listed product without an account",
        )
        .tag("storefront")
        .tag("smoke")
        .tag("purchase"),
        steps,
    )
}
