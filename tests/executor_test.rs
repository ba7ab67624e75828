//! Scenario execution against a scripted page.

mod common;

use common::{Effect, Element, ScriptedPage};
use std::time::Duration;
use uiscout_lib::config::AppConfig;
use uiscout_lib::locator::{Locator, ResolveMode, Target, WaitSettings};
use uiscout_lib::scenario::{
    Catalog, CountExpectation, RunStatus, Scenario, ScenarioExecutor, Step,
};

const PORTAL: &str = "https://f1tcloud.f1tdemo.xyz";

fn executor() -> ScenarioExecutor {
    ScenarioExecutor::with_settings(
        WaitSettings {
            default_timeout: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(100),
            default_mode: ResolveMode::Race,
        },
        Duration::from_millis(2000),
    )
}

fn portal_executor() -> ScenarioExecutor {
    let mut config = AppConfig::default();
    config.credentials.email_env = "UISCOUT_TEST_UNSET_EMAIL".to_string();
    config.credentials.password_env = "UISCOUT_TEST_UNSET_PASS".to_string();
    ScenarioExecutor::new(&config)
}

fn named_submit() -> Locator {
    Locator::role_matching("button", "submit|sign in|log ?in|login")
}

fn login_form() -> ScriptedPage {
    ScriptedPage::new("about:blank")
        .with(Locator::placeholder("Email"), Element::visible())
        .with(Locator::placeholder("Password"), Element::visible())
        .with(named_submit(), Element::visible())
}

fn builtin(name: &str) -> Scenario {
    Catalog::builtin()
        .get(name)
        .cloned()
        .unwrap_or_else(|| panic!("missing builtin {name}"))
}

#[tokio::test(start_paused = true)]
async fn test_portal_login_success_with_redirect() {
    let page = login_form().on_click(
        named_submit(),
        vec![Effect::Navigate(format!("{PORTAL}/dashboard"))],
    );

    let run = portal_executor()
        .execute(&builtin("portal-login-success"), &page)
        .await;

    assert_eq!(run.status, RunStatus::Passed, "{:?}", run.error);
    assert_eq!(page.gotos(), vec![format!("{PORTAL}/login")]);
    assert_eq!(
        page.fills(),
        vec![
            (Locator::placeholder("Email"), "admin@test.com".to_string()),
            (Locator::placeholder("Password"), "123456".to_string()),
        ]
    );
    assert!(run
        .step_results
        .iter()
        .all(|r| !r.description.contains("123456")));
}

#[tokio::test(start_paused = true)]
async fn test_portal_login_success_without_redirect_uses_post_login_ui() {
    let logout = Locator::role_matching("button", "logout|sign out|log out");
    let page = login_form().on_click(named_submit(), vec![Effect::Show(logout)]);

    let run = portal_executor()
        .execute(&builtin("portal-login-success"), &page)
        .await;

    assert_eq!(run.status, RunStatus::Passed, "{:?}", run.error);
}

#[tokio::test(start_paused = true)]
async fn test_portal_login_invalid_sees_error_and_stays() {
    let page = login_form().on_click(
        named_submit(),
        vec![Effect::Show(Locator::css(".error-message"))],
    );

    let run = portal_executor()
        .execute(&builtin("portal-login-invalid"), &page)
        .await;

    assert_eq!(run.status, RunStatus::Passed, "{:?}", run.error);
    let fills = page.fills();
    let (_, password) = &fills[1];
    assert!(password.starts_with("not-the-password-"));
    assert!(!password.contains("${"));
}

#[tokio::test(start_paused = true)]
async fn test_portal_login_invalid_fails_when_no_error_surfaces() {
    let page = login_form();

    let run = portal_executor()
        .execute(&builtin("portal-login-invalid"), &page)
        .await;

    assert_eq!(run.status, RunStatus::Failed);
    let failed = run.failed_step().unwrap();
    assert_eq!(failed.description, "expect login error visible");
    let error = failed.error.as_deref().unwrap();
    assert!(error.contains(
        "role=alert | css=.error-message | css=.alert-error | css=input:invalid, [aria-invalid=\"true\"]"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_portal_login_invalid_fails_when_page_navigates_away() {
    let page = login_form().on_click(
        named_submit(),
        vec![
            Effect::Show(Locator::role("alert")),
            Effect::SetUrl(format!("{PORTAL}/home")),
        ],
    );

    let run = portal_executor()
        .execute(&builtin("portal-login-invalid"), &page)
        .await;

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(
        run.failed_step().unwrap().description,
        "expect url unchanged"
    );
}

#[tokio::test(start_paused = true)]
async fn test_first_failure_stops_the_scenario() {
    let page = ScriptedPage::new("about:blank").with(Locator::css("#later"), Element::visible());
    let scenario = Scenario::new("stops", "")
        .step(Step::goto("https://www.demoblaze.com"))
        .step(Step::click(Target::css("#missing")))
        .step(Step::click(Target::css("#later")));

    let run = executor().execute(&scenario, &page).await;

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.step_results.len(), 2);
    assert_eq!(run.step_results[0].status, RunStatus::Passed);
    assert_eq!(run.failed_step().unwrap().index, 1);
    assert!(page.clicks().is_empty());
    assert!(run.error.unwrap().contains("Target 'css=#missing' not found"));
}

#[tokio::test(start_paused = true)]
async fn test_count_drops_by_one_after_delete() {
    let rows = Locator::css("#tbodyid tr");
    let delete = Locator::role_named("link", "Delete");
    let scenario = Scenario::new("remove", "")
        .step(Step::RememberCount {
            locator: rows.clone(),
            key: "rows".to_string(),
        })
        .step(Step::click(Target::locator(delete.clone())))
        .step(Step::ExpectCount {
            locator: rows.clone(),
            count: CountExpectation::Relative {
                key: "rows".to_string(),
                delta: -1,
            },
            timeout_ms: None,
        });

    let page = ScriptedPage::new("https://www.demoblaze.com/cart.html")
        .with(rows.clone(), Element::visible().count(3))
        .with(delete.clone(), Element::visible())
        .on_click(delete.clone(), vec![Effect::SetCount(rows.clone(), 2)]);
    let run = executor().execute(&scenario, &page).await;
    assert_eq!(run.status, RunStatus::Passed, "{:?}", run.error);

    let stuck = ScriptedPage::new("https://www.demoblaze.com/cart.html")
        .with(rows.clone(), Element::visible().count(3))
        .with(delete.clone(), Element::visible());
    let run = executor().execute(&scenario, &stuck).await;
    assert_eq!(run.status, RunStatus::Failed);
    let error = run.error.unwrap();
    assert!(error.contains("expected 2, got 3"), "{error}");
}

#[tokio::test(start_paused = true)]
async fn test_dialogs_are_consumed_in_order() {
    let signup = Locator::role_named("button", "Sign up");
    let page = ScriptedPage::new("https://www.demoblaze.com")
        .with(signup.clone(), Element::visible())
        .on_click(
            signup.clone(),
            vec![Effect::Dialog("Sign up successful.".to_string())],
        );
    let scenario = Scenario::new("dialogs", "")
        .step(Step::click(Target::locator(signup.clone())))
        .step(Step::wait_for_dialog("Sign up successful"))
        .step(Step::WaitForDialog {
            contains: Some("Sign up successful".to_string()),
            timeout_ms: Some(500),
        });

    let run = executor().execute(&scenario, &page).await;

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.failed_step().unwrap().index, 2);
    assert!(run.error.unwrap().contains("Timed out after 500ms waiting for dialog"));
}

#[tokio::test(start_paused = true)]
async fn test_dialog_with_unexpected_message() {
    let page = ScriptedPage::new("https://www.demoblaze.com");
    page.open_dialog("This user already exist.");
    let scenario = Scenario::new("dialog", "").step(Step::WaitForDialog {
        contains: Some("Sign up successful".to_string()),
        timeout_ms: Some(300),
    });

    let run = executor().execute(&scenario, &page).await;

    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.error.unwrap().contains("'This user already exist.'"));
}

#[tokio::test(start_paused = true)]
async fn test_click_and_wait_for_load() {
    let cart = Locator::role_exact("link", "Cart");
    let scenario = Scenario::new("cart", "").step(Step::ClickAndWaitForLoad {
        target: Target::locator(cart.clone()),
        timeout_ms: Some(400),
    });

    let page = ScriptedPage::new("https://www.demoblaze.com")
        .with(cart.clone(), Element::visible())
        .on_click(
            cart.clone(),
            vec![Effect::Navigate("https://www.demoblaze.com/cart.html".to_string())],
        );
    let run = executor().execute(&scenario, &page).await;
    assert_eq!(run.status, RunStatus::Passed, "{:?}", run.error);

    let dead_link = ScriptedPage::new("https://www.demoblaze.com").with(cart, Element::visible());
    let run = executor().execute(&scenario, &dead_link).await;
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.error.unwrap().contains("Timed out after 400ms"));
}

#[tokio::test(start_paused = true)]
async fn test_any_of_falls_through_to_later_alternative() {
    let page = ScriptedPage::new("https://portal.test/login")
        .with(Locator::css("#welcome"), Element::visible());
    let scenario = Scenario::new("any", "").step(Step::AnyOf {
        steps: vec![
            Step::ExpectUrl {
                pattern: "/login".to_string(),
                matches: false,
                timeout_ms: Some(300),
            },
            Step::expect_visible(Target::css("#welcome")),
        ],
    });

    let run = executor().execute(&scenario, &page).await;
    assert_eq!(run.status, RunStatus::Passed, "{:?}", run.error);
}

#[tokio::test(start_paused = true)]
async fn test_expect_hidden_and_text() {
    let modal = Locator::css("#signInModal");
    let alert = Locator::css(".sweet-alert");
    let page = ScriptedPage::new("https://www.demoblaze.com")
        .with(modal.clone(), Element::visible().hidden_after(250))
        .with(alert.clone(), Element::visible().text("Thank you for your purchase!"));
    let scenario = Scenario::new("hidden", "")
        .step(Step::expect_hidden(Target::locator(modal)))
        .step(Step::ExpectText {
            target: Target::locator(alert),
            contains: "Thank you".to_string(),
            timeout_ms: None,
        });

    let run = executor().execute(&scenario, &page).await;
    assert_eq!(run.status, RunStatus::Passed, "{:?}", run.error);
}

#[tokio::test(start_paused = true)]
async fn test_expect_enabled_fails_for_disabled_control() {
    let submit = Locator::css(".btn-login");
    let page = ScriptedPage::new("https://portal.test/login")
        .with(submit.clone(), Element::visible().disabled());
    let scenario = Scenario::new("enabled", "").step(Step::ExpectEnabled {
        target: Target::locator(submit),
        timeout_ms: Some(200),
    });

    let run = executor().execute(&scenario, &page).await;
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.error.unwrap().contains("expected enabled, got disabled"));
}

#[tokio::test(start_paused = true)]
async fn test_expect_status_uses_last_navigation() {
    let page = ScriptedPage::new("about:blank").status(Some(404));
    let scenario = Scenario::new("status", "")
        .step(Step::goto("https://www.demoblaze.com/missing"))
        .step(Step::ExpectStatus { status: 200 });

    let run = executor().execute(&scenario, &page).await;
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.error.unwrap().contains("expected 200, got 404"));
}

#[tokio::test(start_paused = true)]
async fn test_variables_and_clear_storage() {
    let username = Locator::css("#sign-username");
    let page = ScriptedPage::new("https://www.demoblaze.com").with(username.clone(), Element::visible());
    let scenario = Scenario::new("vars", "")
        .var("username", "user_${run_id}")
        .step(Step::ClearStorage)
        .step(Step::fill(Target::locator(username), "${username}"));

    let run = executor().execute(&scenario, &page).await;

    assert_eq!(run.status, RunStatus::Passed, "{:?}", run.error);
    assert!(page.scripts()[0].contains("localStorage.clear()"));
    let fills = page.fills();
    let (_, value) = &fills[0];
    assert!(value.starts_with("user_"));
    assert!(value.len() > "user_".len());
    assert!(!value.contains('$'));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_scenario_fails_without_touching_page() {
    let page = ScriptedPage::new("about:blank");
    let scenario = Scenario::new("empty", "");

    let run = executor().execute(&scenario, &page).await;

    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.step_results.is_empty());
    assert!(page.inspected().is_empty());
}

const STORE: &str = "https://www.demoblaze.com";

fn storefront_executor() -> ScenarioExecutor {
    executor()
        .with_variable("storefront_url", STORE)
        .with_variable("run_id", "42")
}

fn signup_effects(message: &str, modal_closes_itself: bool) -> Vec<Effect> {
    let mut effects = vec![Effect::Dialog(message.to_string())];
    if modal_closes_itself {
        effects.push(Effect::Hide(Locator::css("#signInModal")));
    }
    effects
}

/// Store front with sign up, log in and contact modals wired to their buttons.
fn account_store(signup_dialogs: [&str; 2], modal_closes_itself: bool) -> ScriptedPage {
    let link = |name: &str| Locator::role_named("link", name);
    let button = |name: &str| Locator::role_named("button", name);

    ScriptedPage::new(STORE)
        .with(Locator::css("#signInModal"), Element::never())
        .with(link("Sign up"), Element::visible())
        .on_click(link("Sign up"), vec![Effect::Show(Locator::css("#signInModal"))])
        .with(Locator::role_named("textbox", "Username:"), Element::visible())
        .with(Locator::role_named("textbox", "Password:"), Element::visible())
        .with(button("Sign up"), Element::visible())
        .on_clicks(
            button("Sign up"),
            signup_dialogs
                .iter()
                .map(|message| signup_effects(message, modal_closes_itself))
                .collect(),
        )
        .with(Locator::css("#signInModal .btn-secondary"), Element::visible())
        .on_click(
            Locator::css("#signInModal .btn-secondary"),
            vec![Effect::Hide(Locator::css("#signInModal"))],
        )
        .with(Locator::css("#logInModal"), Element::never())
        .with(link("Log in"), Element::visible())
        .on_click(link("Log in"), vec![Effect::Show(Locator::css("#logInModal"))])
        .with(Locator::css("#loginusername"), Element::visible())
        .with(Locator::css("#loginpassword"), Element::visible())
        .with(button("Log in"), Element::visible())
        .on_click(
            button("Log in"),
            vec![
                Effect::Hide(Locator::css("#logInModal")),
                Effect::Show(link("Welcome testuser_42")),
            ],
        )
        .with(Locator::css("#exampleModal"), Element::never())
        .with(link("Contact"), Element::visible())
        .on_click(link("Contact"), vec![Effect::Show(Locator::css("#exampleModal"))])
        .with(Locator::css("#recipient-email"), Element::visible())
        .with(Locator::css("#recipient-name"), Element::visible())
        .with(Locator::css("#message-text"), Element::visible())
        .with(button("Send message"), Element::visible())
        .on_click(
            button("Send message"),
            vec![
                Effect::Dialog("Thanks for the message!!".to_string()),
                Effect::Hide(Locator::css("#exampleModal")),
            ],
        )
}

#[tokio::test(start_paused = true)]
async fn test_signup_login_contact_when_modal_closes_itself() {
    let page = account_store(["Sign up successful.", "This user already exist."], true);

    let run = storefront_executor()
        .execute(&builtin("storefront-signup-login-contact"), &page)
        .await;

    assert_eq!(run.status, RunStatus::Passed, "{:?}", run.error);
    assert!(!page
        .clicks()
        .contains(&Locator::css("#signInModal .btn-secondary")));
    let usernames: Vec<_> = page
        .fills()
        .into_iter()
        .filter(|(locator, _)| {
            *locator == Locator::role_named("textbox", "Username:")
                || *locator == Locator::css("#loginusername")
        })
        .map(|(_, value)| value)
        .collect();
    assert_eq!(usernames, vec!["testuser_42"; 3]);
}

#[tokio::test(start_paused = true)]
async fn test_signup_login_contact_closes_modal_that_stays_open() {
    let page = account_store(["Sign up successful.", "This user already exist."], false);

    let run = storefront_executor()
        .execute(&builtin("storefront-signup-login-contact"), &page)
        .await;

    assert_eq!(run.status, RunStatus::Passed, "{:?}", run.error);
    let closes = page
        .clicks()
        .into_iter()
        .filter(|l| *l == Locator::css("#signInModal .btn-secondary"))
        .count();
    assert_eq!(closes, 2);
}

#[tokio::test(start_paused = true)]
async fn test_signup_login_contact_fails_when_duplicate_is_accepted() {
    let page = account_store(["Sign up successful.", "Sign up successful."], true);

    let run = storefront_executor()
        .execute(&builtin("storefront-signup-login-contact"), &page)
        .await;

    assert_eq!(run.status, RunStatus::Failed);
    let error = run.error.unwrap();
    assert!(error.contains("already exist"), "{error}");
    assert!(error.contains("'Sign up successful.'"), "{error}");
    assert!(!page.clicks().contains(&Locator::role_named("link", "Log in")));
}

/// Monitor page and a cart holding `rows` rows; Delete drops one when `deletes`.
fn cart_store(rows: usize, deletes: bool) -> ScriptedPage {
    let link = |name: &str| Locator::role_named("link", name);
    let cart_rows = Locator::css("#tbodyid tr");
    let delete_effects = if deletes {
        vec![
            Effect::SetCount(cart_rows.clone(), rows - 1),
            Effect::Hide(Locator::text("Apple monitor 24")),
        ]
    } else {
        vec![]
    };

    ScriptedPage::new(STORE)
        .with(link("Laptops"), Element::visible())
        .with(link("Monitors"), Element::visible())
        .with(Locator::css("#tbodyid"), Element::visible())
        .with(Locator::text("Sony vaio i5"), Element::visible())
        .with(Locator::text("Apple monitor 24"), Element::visible())
        .with(link("Apple monitor 24"), Element::visible())
        .with(Locator::css(".product-content"), Element::visible())
        .with(
            Locator::text("LED Cinema Display features a 27-inch glossy LED-backlit TFT"),
            Element::visible(),
        )
        .with(Locator::role_matching("heading", r"\$400"), Element::visible())
        .with(link("Add to cart"), Element::visible())
        .on_click(
            link("Add to cart"),
            vec![Effect::Dialog("Product added.".to_string())],
        )
        .with(Locator::role_exact("link", "Cart"), Element::visible())
        .on_click(
            Locator::role_exact("link", "Cart"),
            vec![Effect::Navigate(format!("{STORE}/cart.html"))],
        )
        .with(Locator::css_with_text("tr", "Apple monitor 24"), Element::visible())
        .with(Locator::role_exact("cell", "400"), Element::visible())
        .with(cart_rows, Element::visible().count(rows))
        .with(link("Delete"), Element::visible())
        .on_click(link("Delete"), delete_effects)
}

#[tokio::test(start_paused = true)]
async fn test_cart_remove_item_sees_one_row_less() {
    let page = cart_store(3, true);

    let run = storefront_executor()
        .execute(&builtin("storefront-cart-remove-item"), &page)
        .await;

    assert_eq!(run.status, RunStatus::Passed, "{:?}", run.error);
    assert_eq!(page.gotos(), vec![STORE.to_string()]);
    assert_eq!(
        page.clicks()
            .into_iter()
            .filter(|l| *l == Locator::role_named("link", "Delete"))
            .count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_cart_remove_item_fails_when_row_count_holds() {
    let scenario = builtin("storefront-cart-remove-item");
    let page = cart_store(3, false);

    let run = storefront_executor().execute(&scenario, &page).await;

    assert_eq!(run.status, RunStatus::Failed);
    let count_step = scenario
        .steps
        .iter()
        .position(|s| matches!(s, Step::ExpectCount { .. }))
        .unwrap();
    assert_eq!(run.failed_step().unwrap().index, count_step);
}
