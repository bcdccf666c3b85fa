pub mod family_tree;
pub mod member_list;
