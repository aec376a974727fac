use crate::catalog::ApiDescriptor;

pub(super) fn render_js_fetch(descriptor: &ApiDescriptor, url: &str) -> String {
    let url_literal = serde_json::to_string(url).unwrap_or_else(|_| format!("\"{url}\""));
    let mut out = String::new();
    out.push_str(&format!("// {} ({})\n", descriptor.display_name(), descriptor.id));
    if descriptor.auth_required {
        out.push_str(&format!(
            "// Requires {}. Keep keys out of client-side code.\n",
            descriptor.auth_type
        ));
    }
    out.push_str(&format!("const response = await fetch({url_literal}, {{\n"));
    out.push_str("  method: \"GET\",\n");
    out.push_str("  headers: {\n");
    out.push_str("    \"Accept\": \"application/json\"\n");
    out.push_str("  }\n");
    out.push_str("});\n");
    out.push_str("const data = await response.json();\n");
    out.push_str("console.log(data);\n");
    out
}
