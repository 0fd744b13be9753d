//! Page content templates.

const HOME: &str = r#"
<div class="p-4">
    <h1 class="text-3xl font-bold mb-4">Welcome</h1>
    <p class="text-gray-600">This is the home page of your PWA template.</p>
    <p class="text-gray-600 mt-4">Start building your app here!</p>
</div>
"#;

const SECTION1: &str = r#"
<div class="p-4">
    <h1 class="text-3xl font-bold mb-4">Section 1</h1>
    <p class="text-gray-600">This is section 1 content.</p>
</div>
"#;

const SECTION2: &str = r#"
<div class="p-4">
    <h1 class="text-3xl font-bold mb-4">Section 2</h1>
    <p class="text-gray-600">This is section 2 content.</p>
</div>
"#;

const SETTINGS: &str = r#"
<div class="p-4">
    <h1 class="text-3xl font-bold mb-4">Settings</h1>
    <p class="text-gray-600">App settings will go here.</p>
</div>
"#;

/// HTML for a component. Unknown components render the home page.
pub fn component_content(component: &str) -> &'static str {
    match component {
        "section1" => SECTION1,
        "section2" => SECTION2,
        "settings" => SETTINGS,
        _ => HOME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_components() {
        assert!(component_content("home").contains("Welcome"));
        assert!(component_content("section1").contains("section 1 content"));
        assert!(component_content("section2").contains("section 2 content"));
        assert!(component_content("settings").contains("App settings"));
    }

    #[test]
    fn test_unknown_component_renders_home() {
        assert_eq!(component_content("missing"), component_content("home"));
    }
}
