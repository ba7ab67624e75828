use crate::locator::{Locator, Strategy, Target};
use crate::scenario::{Scenario, Step};

const LOGIN_PATH: &str = "${portal_url}/login";

fn email_field() -> Target {
    Target::locator(Locator::placeholder("Email"))
}

fn password_field() -> Target {
    Target::locator(Locator::placeholder("Password"))
}

/// The named button when it shows up within two seconds, else `.btn-login`.
pub fn submit_control() -> Target {
    Target::first_of(
        "submit control",
        vec![
            Strategy::with_timeout(
                Locator::role_matching("button", "submit|sign in|log ?in|login"),
                2000,
            ),
            Strategy::new(Locator::css(".btn-login")),
        ],
    )
    .sequential()
}

fn post_login_ui() -> Target {
    Target::first_of(
        "post-login UI",
        vec![
            Strategy::new(Locator::role_matching(
                "link",
                "dashboard|members|overview|home",
            )),
            Strategy::new(Locator::role_matching("button", "logout|sign out|log out")),
        ],
    )
    .race(15_000)
}

/// Any of the ways the portal reports rejected credentials.
pub fn login_error() -> Target {
    Target::first_of(
        "login error",
        vec![
            Strategy::new(Locator::role("alert")),
            Strategy::new(Locator::css(".error-message")),
            Strategy::new(Locator::css(".alert-error")),
            Strategy::new(Locator::css("input:invalid, [aria-invalid=\"true\"]")),
        ],
    )
    .race(10_000)
}

pub fn login_success() -> Scenario {
    Scenario::new(
        "portal-login-success",
        "Log in with valid credentials and land on the post-login UI",
    )
    .tag("portal")
    .tag("smoke")
    .step(Step::goto(LOGIN_PATH))
    .step(Step::expect_visible(email_field()))
    .step(Step::expect_visible(password_field()))
    .step(Step::expect_visible(submit_control()))
    .step(Step::fill(email_field(), "${portal_email}"))
    .step(Step::fill(password_field(), "${portal_password}"))
    .step(Step::ExpectEnabled {
        target: submit_control(),
        timeout_ms: None,
    })
    .step(Step::click(submit_control()))
    .step(Step::AnyOf {
        steps: vec![
            Step::ExpectUrl {
                pattern: "/login".to_string(),
                matches: false,
                timeout_ms: Some(15_000),
            },
            Step::expect_visible(post_login_ui()),
        ],
    })
}

pub fn login_invalid() -> Scenario {
    Scenario::new(
        "portal-login-invalid",
        "Reject a wrong password without leaving the login page",
    )
    .tag("portal")
    .var("wrong_password", "not-the-password-${run_id}")
    .step(Step::goto(LOGIN_PATH))
    .step(Step::fill(email_field(), "${portal_email}"))
    .step(Step::fill(password_field(), "${wrong_password}"))
    .step(Step::click(submit_control()))
    .step(Step::expect_visible(login_error()))
    .step(Step::ExpectUrlUnchanged)
}
