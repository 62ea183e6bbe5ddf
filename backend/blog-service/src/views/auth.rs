use super::{escape, field_errors, layout, non_field_errors};
use crate::forms::FormErrors;

pub fn signup_page(username: &str, errors: &FormErrors) -> String {
    let content = format!(
        r#"    <h1>Sign up</h1>
    <form class="signup-form" method="post" action="/auth/signup/">
      {non_field}
      <label for="id_username">Username</label>
      <input type="text" name="username" id="id_username" maxlength="150" value="{username}" required>
      <small>Required. 150 characters or fewer. Letters, digits and @/./+/-/_ only.</small>
      {username_errors}
      <label for="id_password1">Password</label>
      <input type="password" name="password1" id="id_password1" required>
      {password1_errors}
      <label for="id_password2">Password confirmation</label>
      <input type="password" name="password2" id="id_password2" required>
      {password2_errors}
      <button type="submit">Sign up</button>
    </form>
"#,
        non_field = non_field_errors(errors),
        username = escape(username),
        username_errors = field_errors(errors, "username"),
        password1_errors = field_errors(errors, "password1"),
        password2_errors = field_errors(errors, "password2"),
    );
    layout("Sign up", "signup", None, &content)
}

pub fn login_page(username: &str, next: Option<&str>, errors: &FormErrors) -> String {
    let next_input = next
        .map(|n| {
            format!(
                r#"
      <input type="hidden" name="next" value="{}">"#,
                escape(n)
            )
        })
        .unwrap_or_default();

    let content = format!(
        r#"    <h1>Log in</h1>
    <form class="login-form" method="post" action="/auth/login/">
      {non_field}{next_input}
      <label for="id_username">Username</label>
      <input type="text" name="username" id="id_username" value="{username}" required>
      {username_errors}
      <label for="id_password">Password</label>
      <input type="password" name="password" id="id_password" required>
      {password_errors}
      <button type="submit">Log in</button>
    </form>
    <p>No account yet? <a href="/auth/signup/">Sign up</a></p>
"#,
        non_field = non_field_errors(errors),
        next_input = next_input,
        username = escape(username),
        username_errors = field_errors(errors, "username"),
        password_errors = field_errors(errors, "password"),
    );
    layout("Log in", "login", None, &content)
}
