use serde::Deserialize;

const NAME_MAX: usize = 30;
const BIO_MAX: usize = 500;
const POST_MAX: usize = 10_000;
const COMMENT_MAX: usize = 2_000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        validate_username(&self.username, &mut errors);
        validate_email(&self.email, &mut errors);
        validate_name("First name", &self.first_name, &mut errors);
        validate_name("Last name", &self.last_name, &mut errors);
        if self.password.len() < 8 {
            errors.push("Password must be at least 8 characters.".into());
        }
        if self.password != self.password_confirm {
            errors.push("Passwords do not match.".into());
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.username.trim().is_empty() {
            errors.push("Username is required.".into());
        }
        if self.password.is_empty() {
            errors.push("Password is required.".into());
        }
        errors
    }
}

/// Combined user + profile edit form. The avatar travels separately as a
/// multipart file field.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        validate_username(&self.username, &mut errors);
        validate_email(&self.email, &mut errors);
        validate_name("First name", &self.first_name, &mut errors);
        validate_name("Last name", &self.last_name, &mut errors);
        if self.bio.chars().count() > BIO_MAX {
            errors.push(format!("Bio must be at most {} characters.", BIO_MAX));
        }
        errors
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub content: String,
}

impl PostForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.content.trim().is_empty() {
            errors.push("Post content cannot be empty.".into());
        } else if self.content.chars().count() > POST_MAX {
            errors.push(format!("Posts are limited to {} characters.", POST_MAX));
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub content: String,
}

impl CommentForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.content.trim().is_empty() {
            errors.push("Comment cannot be empty.".into());
        } else if self.content.chars().count() > COMMENT_MAX {
            errors.push(format!("Comments are limited to {} characters.", COMMENT_MAX));
        }
        errors
    }
}

fn validate_username(username: &str, errors: &mut Vec<String>) {
    let username = username.trim();
    if username.is_empty() {
        errors.push("Username is required.".into());
    } else if username.len() > NAME_MAX {
        errors.push(format!("Username must be at most {} characters.", NAME_MAX));
    } else if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        errors.push("Username may only contain letters, digits and underscores.".into());
    }
}

fn validate_email(email: &str, errors: &mut Vec<String>) {
    let email = email.trim();
    if email.is_empty() {
        errors.push("Email is required.".into());
    } else if !email.contains('@') {
        errors.push("Enter a valid email address.".into());
    }
}

fn validate_name(label: &str, value: &str, errors: &mut Vec<String>) {
    if value.trim().is_empty() {
        errors.push(format!("{} is required.", label));
    } else if value.chars().count() > NAME_MAX {
        errors.push(format!("{} must be at most {} characters.", label, NAME_MAX));
    }
}
