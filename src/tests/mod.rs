mod notes_list;
