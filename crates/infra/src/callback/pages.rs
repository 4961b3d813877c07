//! Static pages shown in the browser after the redirect.

pub const SUCCESS: &str = r#"<!DOCTYPE html>
<html>
<head><title>RaidAssist - Login Complete</title></head>
<body><h1>Login successful</h1><p>You can close this window and return to RaidAssist.</p></body>
</html>"#;

pub const FAILURE: &str = r#"<!DOCTYPE html>
<html>
<head><title>RaidAssist - Login Failed</title></head>
<body><h1>Login failed</h1><p>Bungie.net did not authorize RaidAssist. Return to the app to try again.</p></body>
</html>"#;

pub const MISSING_CODE: &str = r#"<!DOCTYPE html>
<html>
<head><title>RaidAssist - Login</title></head>
<body><h1>No authorization code received</h1><p>This page expects a redirect from Bungie.net.</p></body>
</html>"#;

pub const ALREADY_HANDLED: &str = r#"<!DOCTYPE html>
<html>
<head><title>RaidAssist - Login</title></head>
<body><h1>Already handled</h1><p>This login attempt has already completed. You can close this window.</p></body>
</html>"#;
