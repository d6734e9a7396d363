mod group_dto;

pub use group_dto::{
    AddUsersToGroupDto, CreateGroupDto, DeleteGroupQuery, GroupResponseDto, GroupsOfUserQuery,
    RemoveUserFromGroupQuery,
};
