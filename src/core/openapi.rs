use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth::{dtos as auth_dtos, handlers::auth_handler, models as auth_models};
use crate::features::comments::{dtos as comments_dtos, handlers::comment_handler};
use crate::features::files::handlers::file_handler;
use crate::features::groups::{dtos as groups_dtos, handlers::group_handler};
use crate::features::posts::{dtos as posts_dtos, handlers::post_handler, models as posts_models};
use crate::features::users::{dtos as users_dtos, handlers::user_handler, models as users_models};
use crate::modules::storage::FileDescriptor;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth_handler::signup,
        auth_handler::login,
        auth_handler::get_me,
        auth_handler::logout,
        auth_handler::change_username,
        auth_handler::change_password,
        auth_handler::google_login,
        auth_handler::google_callback,
        // Posts
        post_handler::get_posts,
        post_handler::create_post,
        post_handler::delete_post,
        // Comments
        comment_handler::list_comments,
        comment_handler::create_comment,
        comment_handler::delete_comment,
        // Groups
        group_handler::list_groups,
        group_handler::groups_of_user,
        group_handler::create_group,
        group_handler::delete_group,
        group_handler::add_users_to_group,
        group_handler::remove_user_from_group,
        // Users
        user_handler::get_user,
        user_handler::users_of_group,
        user_handler::upload_profile_picture,
        user_handler::remove_profile_picture,
        // Files
        file_handler::get_upload,
        file_handler::get_profile_picture,
    ),
    components(
        schemas(
            // Shared
            Meta,
            FileDescriptor,
            // Auth
            auth_models::AuthenticatedUser,
            auth_dtos::SignupDto,
            auth_dtos::LoginDto,
            auth_dtos::SessionResponseDto,
            auth_dtos::MeResponseDto,
            auth_dtos::ChangeUsernameDto,
            auth_dtos::ChangePasswordDto,
            ApiResponse<auth_dtos::SessionResponseDto>,
            ApiResponse<auth_dtos::MeResponseDto>,
            // Users
            users_models::Role,
            users_dtos::UserResponseDto,
            users_dtos::GroupMemberDto,
            users_dtos::UploadProfilePictureDto,
            ApiResponse<users_dtos::UserResponseDto>,
            ApiResponse<Vec<users_dtos::GroupMemberDto>>,
            ApiResponse<FileDescriptor>,
            // Posts
            posts_models::Visibility,
            posts_dtos::PostFeedDto,
            posts_dtos::CommentFeedDto,
            posts_dtos::CreatePostDto,
            ApiResponse<Vec<posts_dtos::PostFeedDto>>,
            ApiResponse<posts_dtos::PostFeedDto>,
            // Comments
            comments_dtos::CommentResponseDto,
            comments_dtos::CreateCommentDto,
            ApiResponse<Vec<comments_dtos::CommentResponseDto>>,
            ApiResponse<comments_dtos::CommentResponseDto>,
            // Groups
            groups_dtos::GroupResponseDto,
            groups_dtos::CreateGroupDto,
            groups_dtos::AddUsersToGroupDto,
            ApiResponse<Vec<groups_dtos::GroupResponseDto>>,
            ApiResponse<groups_dtos::GroupResponseDto>,
        )
    ),
    tags(
        (name = "auth", description = "Signup, login, sessions and Google sign-in"),
        (name = "posts", description = "Posts and the authorization-aware feed"),
        (name = "comments", description = "Comments on posts"),
        (name = "groups", description = "Group management and membership"),
        (name = "users", description = "User lookup and profile pictures"),
        (name = "files", description = "Stored file retrieval"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Nexus API",
        version = "0.1.0",
        description = "API documentation for Nexus",
    )
)]
pub struct ApiDoc;

/// Adds the session-token bearer scheme to the OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
