pub fn get_signature(version: &str) -> String {
    format!(
        r#"
   ___________
  |  _______  |             📦 Scribepack (marketplace client for GitScribe)
  | |  ___  | |
  | | |   | | |             Plugins, icon packs and themes for your repositories.
  | | |___| | |
  | |_______| |             https://gitscribe.dev/marketplace
  |___________|
                            v{}
"#,
        version
    )
}
