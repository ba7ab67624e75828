//! In-page locator runtime.
//!
//! Every locator operation is one `Runtime.evaluate` call: the runtime below,
//! applied to the locator serialized as JSON. JSON is a valid JavaScript
//! literal, so no hand escaping is needed.

use crate::locator::Locator;

/// Operations the runtime understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorOp {
    Inspect,
    Click,
    Fill,
}

impl LocatorOp {
    fn as_str(self) -> &'static str {
        match self {
            LocatorOp::Inspect => "inspect",
            LocatorOp::Click => "click",
            LocatorOp::Fill => "fill",
        }
    }
}

const RUNTIME: &str = r##"
(function (loc, op, arg) {
    function norm(s) { return String(s || "").replace(/\s+/g, " ").trim(); }

    function textMatches(m, raw) {
        if (!m) return true;
        const value = norm(raw);
        switch (m.kind) {
            case "exact": return value === norm(m.value);
            case "contains": return value.toLowerCase().includes(norm(m.value).toLowerCase());
            case "pattern":
                try { return new RegExp(m.source, m.ignore_case ? "i" : "").test(value); }
                catch (e) { return false; }
        }
        return false;
    }

    function roleOf(el) {
        const explicit = el.getAttribute("role");
        if (explicit) return explicit.trim().split(/\s+/)[0].toLowerCase();
        const tag = el.tagName.toLowerCase();
        const type = (el.getAttribute("type") || "text").toLowerCase();
        switch (tag) {
            case "a": case "area": return el.hasAttribute("href") ? "link" : null;
            case "button": return "button";
            case "input":
                if (["button", "submit", "reset", "image"].includes(type)) return "button";
                if (type === "checkbox") return "checkbox";
                if (type === "radio") return "radio";
                if (["text", "email", "tel", "url", "search", "password", "number"].includes(type)) return "textbox";
                return null;
            case "textarea": return "textbox";
            case "select": return "combobox";
            case "td": return "cell";
            case "th": return "columnheader";
            case "tr": return "row";
            case "table": return "table";
            case "h1": case "h2": case "h3": case "h4": case "h5": case "h6": return "heading";
            case "img": return "img";
            case "nav": return "navigation";
            case "dialog": return "dialog";
            case "form": return "form";
        }
        return null;
    }

    function nameOf(el) {
        const labelledBy = el.getAttribute("aria-labelledby");
        if (labelledBy) {
            const text = labelledBy.split(/\s+/).map(function (id) {
                const node = document.getElementById(id);
                return node ? node.textContent : "";
            }).join(" ");
            if (norm(text)) return norm(text);
        }
        const aria = el.getAttribute("aria-label");
        if (norm(aria)) return norm(aria);
        const tag = el.tagName.toLowerCase();
        if (tag === "input" || tag === "textarea" || tag === "select") {
            const labels = el.labels ? Array.from(el.labels).map(function (l) { return l.textContent; }).join(" ") : "";
            if (norm(labels)) return norm(labels);
            const type = (el.getAttribute("type") || "").toLowerCase();
            if (["button", "submit", "reset"].includes(type) && el.value) return norm(el.value);
            if (norm(el.getAttribute("title"))) return norm(el.getAttribute("title"));
            return norm(el.getAttribute("placeholder"));
        }
        if (tag === "img") return norm(el.getAttribute("alt"));
        return norm(el.textContent);
    }

    function visible(el) {
        const rect = el.getBoundingClientRect();
        if (rect.width === 0 || rect.height === 0) return false;
        const style = window.getComputedStyle(el);
        return style.visibility !== "hidden" && style.display !== "none";
    }

    function query(loc) {
        const all = Array.from(document.querySelectorAll("body *"));
        switch (loc.by) {
            case "css": {
                const found = Array.from(document.querySelectorAll(loc.selector));
                if (loc.has_text == null) return found;
                const needle = norm(loc.has_text).toLowerCase();
                return found.filter(function (el) { return norm(el.textContent).toLowerCase().includes(needle); });
            }
            case "role":
                return all.filter(function (el) {
                    return roleOf(el) === loc.role.toLowerCase() && textMatches(loc.name, nameOf(el));
                });
            case "placeholder":
                return all.filter(function (el) {
                    return el.hasAttribute("placeholder") && textMatches(loc.text, el.getAttribute("placeholder"));
                });
            case "text": {
                const skip = ["SCRIPT", "STYLE", "NOSCRIPT", "TEMPLATE"];
                const hits = all.filter(function (el) {
                    return !skip.includes(el.tagName) && textMatches(loc.text, el.textContent);
                });
                return hits.filter(function (el) {
                    return !hits.some(function (other) { return other !== el && el.contains(other); });
                });
            }
        }
        throw new Error("unknown locator kind: " + loc.by);
    }

    const found = query(loc);
    const target = found.find(visible) || null;

    if (op === "inspect") {
        const el = target || found[0] || null;
        return {
            count: found.length,
            visible: target !== null,
            enabled: el !== null && !el.disabled && el.getAttribute("aria-disabled") !== "true",
            text: el === null ? null : norm(el.innerText || el.value || el.textContent)
        };
    }
    if (target === null) return false;
    if (op === "click") {
        target.scrollIntoView({ block: "center", inline: "center" });
        target.click();
        return true;
    }
    if (op === "fill") {
        target.focus();
        const proto = target.tagName === "TEXTAREA" ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
        const setter = Object.getOwnPropertyDescriptor(proto, "value");
        if (setter && setter.set && (target instanceof HTMLInputElement || target instanceof HTMLTextAreaElement)) {
            setter.set.call(target, arg);
        } else {
            target.value = arg;
        }
        target.dispatchEvent(new Event("input", { bubbles: true }));
        target.dispatchEvent(new Event("change", { bubbles: true }));
        return true;
    }
    throw new Error("unknown op: " + op);
})"##;

/// Build the expression evaluating `op` for `locator`.
pub fn locator_expression(locator: &Locator, op: LocatorOp, arg: Option<&str>) -> String {
    let loc = serde_json::to_string(locator).unwrap_or_else(|_| "null".to_string());
    let arg = serde_json::to_string(&arg).unwrap_or_else(|_| "null".to_string());
    format!("{}({}, \"{}\", {})", RUNTIME.trim(), loc, op.as_str(), arg)
}

/// Clears both web storage areas.
pub const CLEAR_STORAGE: &str = "(function () { localStorage.clear(); sessionStorage.clear(); return true; })()";
