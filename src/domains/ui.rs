//! UI domain: layout chrome, drawers, theme colours and interaction switches.

use super::{CSS_LENGTH, Domain, DomainSettings, HEX_COLOR};
use crate::schema::Schema;
use serde_json::{Value, json};

/// Marker for the `ui` domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct UiSettings;

const DRAWER_BEHAVIORS: [&str; 3] = ["desktop", "mobile", "responsive"];

const THEME_COLORS: [&str; 8] = [
    "primary",
    "secondary",
    "accent",
    "positive",
    "negative",
    "info",
    "warning",
    "background",
];

fn bar() -> Schema {
    Schema::object()
        .required(["show", "height", "elevated", "bordered", "fixed"])
        .property("show", Schema::boolean())
        .property("height", Schema::string().pattern(CSS_LENGTH))
        .property("elevated", Schema::boolean())
        .property("bordered", Schema::boolean())
        .property("fixed", Schema::boolean())
}

fn left_drawer() -> Schema {
    Schema::object()
        .required([
            "show",
            "overlay",
            "elevated",
            "bordered",
            "behavior",
            "width",
            "miniWidth",
            "breakpoint",
            "mini",
            "miniToOverlay",
            "showIfAbove",
            "fixed",
            "persistent",
        ])
        .property("show", Schema::boolean())
        .property("overlay", Schema::boolean())
        .property("elevated", Schema::boolean())
        .property("bordered", Schema::boolean())
        .property("behavior", Schema::string().enumeration(DRAWER_BEHAVIORS))
        .property("width", Schema::number().minimum(0.0))
        .property("miniWidth", Schema::number().minimum(0.0))
        .property("breakpoint", Schema::number().minimum(0.0))
        .property("mini", Schema::boolean())
        .property("miniToOverlay", Schema::boolean())
        .property("showIfAbove", Schema::boolean())
        .property("fixed", Schema::boolean())
        .property("persistent", Schema::boolean())
}

fn right_drawer() -> Schema {
    Schema::object()
        .required([
            "show",
            "overlay",
            "elevated",
            "bordered",
            "behavior",
            "width",
            "showIfAbove",
            "fixed",
            "persistent",
        ])
        .property("show", Schema::boolean())
        .property("overlay", Schema::boolean())
        .property("elevated", Schema::boolean())
        .property("bordered", Schema::boolean())
        .property("behavior", Schema::string().enumeration(DRAWER_BEHAVIORS))
        .property("width", Schema::number().minimum(0.0))
        .property("showIfAbove", Schema::boolean())
        .property("fixed", Schema::boolean())
        .property("persistent", Schema::boolean())
}

fn theme() -> Schema {
    let mut theme = Schema::object()
        .required(["dark"])
        .required(THEME_COLORS)
        .property("dark", Schema::boolean());
    for color in THEME_COLORS {
        theme = theme.property(color, Schema::string().pattern(HEX_COLOR));
    }
    theme
}

impl DomainSettings for UiSettings {
    const DOMAIN: Domain = Domain::Ui;

    fn schema() -> Schema {
        Schema::object()
            .required([
                "header",
                "footer",
                "leftDrawer",
                "rightDrawer",
                "page",
                "layout",
                "theme",
                "toolbar",
                "animations",
                "behavior",
            ])
            .property("header", bar())
            .property("footer", bar())
            .property("leftDrawer", left_drawer())
            .property("rightDrawer", right_drawer())
            .property(
                "page",
                Schema::object()
                    .required(["padded", "paddingSize", "containerWidth", "elevated", "bordered"])
                    .property("padded", Schema::boolean())
                    .property(
                        "paddingSize",
                        Schema::string().enumeration(["xs", "sm", "md", "lg", "xl"]),
                    )
                    .property("containerWidth", Schema::string().pattern(CSS_LENGTH))
                    .property("elevated", Schema::boolean())
                    .property("bordered", Schema::boolean()),
            )
            .property(
                "layout",
                Schema::object()
                    .required(["view", "containerized", "scrollable"])
                    // Three rows of three letters: header, page, footer
                    .property(
                        "view",
                        Schema::string()
                            .pattern(r"^[hHl][HhR][hHr]\s[LlH][pPr][RrH]\s[fFl][Ffr][fFr]$"),
                    )
                    .property("containerized", Schema::boolean())
                    .property("scrollable", Schema::boolean()),
            )
            .property("theme", theme())
            .property(
                "toolbar",
                Schema::object()
                    .required([
                        "dense",
                        "showTitle",
                        "showNavButton",
                        "showSearch",
                        "flat",
                        "glossy",
                    ])
                    .property("dense", Schema::boolean())
                    .property("showTitle", Schema::boolean())
                    .property("showNavButton", Schema::boolean())
                    .property("showSearch", Schema::boolean())
                    .property("flat", Schema::boolean())
                    .property("glossy", Schema::boolean()),
            )
            .property(
                "animations",
                Schema::object()
                    .required(["pageTransition", "drawerTransition"])
                    .property("pageTransition", Schema::string())
                    .property("drawerTransition", Schema::string()),
            )
            .property(
                "behavior",
                Schema::object()
                    .required([
                        "backToTop",
                        "mobileBreakpoint",
                        "tabletBreakpoint",
                        "stickyHeaders",
                        "preserveScroll",
                        "ripple",
                    ])
                    .property("backToTop", Schema::boolean())
                    .property("mobileBreakpoint", Schema::number().minimum(0.0))
                    .property("tabletBreakpoint", Schema::number().minimum(0.0))
                    .property("stickyHeaders", Schema::boolean())
                    .property("preserveScroll", Schema::boolean())
                    .property("ripple", Schema::boolean()),
            )
    }

    fn defaults() -> Value {
        json!({
            "header": {
                "show": true,
                "height": "164px",
                "elevated": false,
                "bordered": false,
                "fixed": true
            },
            "footer": {
                "show": true,
                "height": "48px",
                "elevated": false,
                "bordered": true,
                "fixed": false
            },
            "leftDrawer": {
                "show": true,
                "overlay": false,
                "elevated": true,
                "bordered": false,
                "behavior": "desktop",
                "width": 256,
                "miniWidth": 60,
                "breakpoint": 1023,
                "mini": false,
                "miniToOverlay": true,
                "showIfAbove": true,
                "fixed": true,
                "persistent": false
            },
            "rightDrawer": {
                "show": false,
                "overlay": true,
                "elevated": true,
                "bordered": false,
                "behavior": "mobile",
                "width": 300,
                "showIfAbove": false,
                "fixed": true,
                "persistent": false
            },
            "page": {
                "padded": true,
                "paddingSize": "md",
                "containerWidth": "1200px",
                "elevated": false,
                "bordered": false
            },
            "layout": {
                "view": "hHh LpR fFf",
                "containerized": false,
                "scrollable": true
            },
            "theme": {
                "dark": false,
                "primary": "#1976D2",
                "secondary": "#26A69A",
                "accent": "#9C27B0",
                "positive": "#21BA45",
                "negative": "#C10015",
                "info": "#31CCEC",
                "warning": "#F2C037",
                "background": "#f5f5f5"
            },
            "toolbar": {
                "dense": false,
                "showTitle": true,
                "showNavButton": true,
                "showSearch": true,
                "flat": false,
                "glossy": true
            },
            "animations": {
                "pageTransition": "fade",
                "drawerTransition": "slide-right"
            },
            "behavior": {
                "backToTop": true,
                "mobileBreakpoint": 600,
                "tabletBreakpoint": 1024,
                "stickyHeaders": true,
                "preserveScroll": true,
                "ripple": true
            }
        })
    }
}
