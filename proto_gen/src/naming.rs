/* Naming helpers shared by the host lowering policy and the resolver */

/// `player_name` -> `PlayerName`. Characters after the first of each segment are kept as-is.
pub fn snake_case_to_camel_case(raw: &str) -> String {
  raw
    .split(|c| c == '_' || c == '-')
    .filter(|segment| !segment.is_empty())
    .map(|segment| {
      let mut chars = segment.chars();
      match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
      }
    })
    .collect()
}

/// Class name of a schema file, derived from its stem (`game_common` -> `GameCommon`).
pub fn class_name(stem: &str) -> String {
  snake_case_to_camel_case(stem)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn converts_snake_case() {
    assert_eq!(snake_case_to_camel_case("player_name"), "PlayerName");
    assert_eq!(snake_case_to_camel_case("x"), "X");
    assert_eq!(snake_case_to_camel_case("__hp__max"), "HpMax");
    assert_eq!(snake_case_to_camel_case("alreadyCamel"), "AlreadyCamel");
    assert_eq!(snake_case_to_camel_case(""), "");
  }

  #[test]
  fn class_name_from_stem() {
    assert_eq!(class_name("game_common"), "GameCommon");
    assert_eq!(class_name("lobby-service"), "LobbyService");
  }
}
