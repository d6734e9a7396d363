mod auth_dto;

pub use auth_dto::{
    ChangePasswordDto, ChangeUsernameDto, GoogleCallbackQuery, GoogleLoginQuery, LoginDto,
    MeResponseDto, SessionResponseDto, SignupDto,
};
