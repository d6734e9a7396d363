mod user_dto;

pub use user_dto::{
    is_profile_picture_allowed, GroupMemberDto, UploadProfilePictureDto, UserQuery,
    UserResponseDto, UsersOfGroupQuery,
};
